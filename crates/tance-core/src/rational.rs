//! 有理数类型, 用于时间基 (time_base).

use std::fmt;

/// 有理数, 由分子和分母组成
///
/// 例如: ADTS 流的时间基为 1/采样率, 微秒时间基为 1/1_000_000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    /// 分子
    pub num: i32,
    /// 分母
    pub den: i32,
}

impl Rational {
    /// 创建新的有理数
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// 未定义 (分母为 0)
    pub const UNDEFINED: Self = Self { num: 0, den: 0 };

    /// 微秒时间基 (1/1_000_000), 时长预扫描以此为中间单位
    pub const MICRO: Self = Self {
        num: 1,
        den: 1_000_000,
    };

    /// 判断是否有效 (分母不为 0)
    pub const fn is_valid(&self) -> bool {
        self.den != 0
    }

    /// 转换为 f64, 分母为 0 时返回 `f64::NAN`
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return f64::NAN;
        }
        f64::from(self.num) / f64::from(self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}
