//! 时间戳换算.
//!
//! 基于 `time_base` 的整数时间戳, 换算使用 128 位中间值避免溢出.

use crate::rational::Rational;

/// 表示"未定义"的时间戳值
pub const NOPTS_VALUE: i64 = i64::MIN;

/// 将 `value` 从时间基 `from` 换算到时间基 `to`, 结果四舍五入 (远离零)
///
/// 任一时间基无效或 `value` 为 `NOPTS_VALUE` 时返回 `NOPTS_VALUE`.
pub fn rescale_q(value: i64, from: Rational, to: Rational) -> i64 {
    if value == NOPTS_VALUE || !from.is_valid() || !to.is_valid() || to.num == 0 {
        return NOPTS_VALUE;
    }
    let num = i128::from(value) * i128::from(from.num) * i128::from(to.den);
    let den = i128::from(from.den) * i128::from(to.num);
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let half = den / 2;
    let rounded = if num >= 0 {
        (num + half) / den
    } else {
        (num - half) / den
    };
    i64::try_from(rounded).unwrap_or(NOPTS_VALUE)
}

/// 将时间戳转换为秒, 无效时返回 `None`
pub fn to_seconds(value: i64, time_base: Rational) -> Option<f64> {
    if value == NOPTS_VALUE || !time_base.is_valid() {
        return None;
    }
    Some(value as f64 * time_base.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rescale_微秒到采样率() {
        // 1 秒 = 1_000_000 us -> 44100 个采样
        assert_eq!(
            rescale_q(1_000_000, Rational::MICRO, Rational::new(1, 44100)),
            44100
        );
    }

    #[test]
    fn test_rescale_四舍五入() {
        // 23220 us * 44100 / 1e6 = 1024.002 -> 1024
        assert_eq!(rescale_q(23220, Rational::MICRO, Rational::new(1, 44100)), 1024);
        // 15 us * 1/10 -> 1.5 -> 2
        assert_eq!(rescale_q(15, Rational::new(1, 10), Rational::new(1, 1)), 2);
        assert_eq!(rescale_q(-15, Rational::new(1, 10), Rational::new(1, 1)), -2);
    }

    #[test]
    fn test_rescale_无效时间基() {
        assert_eq!(
            rescale_q(100, Rational::UNDEFINED, Rational::MICRO),
            NOPTS_VALUE
        );
        assert_eq!(rescale_q(NOPTS_VALUE, Rational::MICRO, Rational::MICRO), NOPTS_VALUE);
    }

    #[test]
    fn test_to_seconds() {
        let secs = to_seconds(48000, Rational::new(1, 48000));
        assert!(matches!(secs, Some(s) if (s - 1.0).abs() < f64::EPSILON));
        assert!(to_seconds(NOPTS_VALUE, Rational::MICRO).is_none());
    }
}
