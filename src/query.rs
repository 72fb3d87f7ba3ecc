use std::fmt;

/// 用户输入的链标识：链ID或链名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainQuery {
    /// 数字链ID，覆盖整个 u64 范围；负数或超出范围的值不会命中任何链
    Numeric(i128),
    /// 链名称 (可能拼写错误或大小写不同)
    Text(String),
}

impl ChainQuery {
    /// 在输入边界处一次性判定查询类型
    ///
    /// 十进制整数 (可带符号) 和 `0x` 前缀的十六进制都视为链ID，其余为文本。
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Some(id) = parse_decimal(trimmed) {
            return ChainQuery::Numeric(id);
        }

        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"));
        if let Some(id) = hex.and_then(parse_hex) {
            return ChainQuery::Numeric(id);
        }

        ChainQuery::Text(trimmed.to_string())
    }
}

/// 可带符号的十进制整数，溢出时取饱和值
fn parse_decimal(s: &str) -> Option<i128> {
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let saturated = if negative { i128::MIN } else { i128::MAX };
    Some(s.parse::<i128>().unwrap_or(saturated))
}

/// `0x` 之后的十六进制数字，不允许符号
fn parse_hex(digits: &str) -> Option<i128> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(i128::from_str_radix(digits, 16).unwrap_or(i128::MAX))
}

impl From<u64> for ChainQuery {
    fn from(id: u64) -> Self {
        ChainQuery::Numeric(i128::from(id))
    }
}

impl fmt::Display for ChainQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainQuery::Numeric(id) => write!(f, "链ID {}", id),
            ChainQuery::Text(name) => write!(f, "名称 \"{}\"", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_and_signed_integers_are_numeric() {
        assert_eq!(ChainQuery::parse("137"), ChainQuery::Numeric(137));
        assert_eq!(ChainQuery::parse(" 56 "), ChainQuery::Numeric(56));
        assert_eq!(ChainQuery::parse("-5"), ChainQuery::Numeric(-5));
    }

    #[test]
    fn hex_chain_ids_are_numeric() {
        assert_eq!(ChainQuery::parse("0x89"), ChainQuery::Numeric(137));
        assert_eq!(ChainQuery::parse("0XA"), ChainQuery::Numeric(10));
    }

    #[test]
    fn everything_else_is_text() {
        assert_eq!(
            ChainQuery::parse("  Polygon Mainnet "),
            ChainQuery::Text("Polygon Mainnet".to_string())
        );
        assert_eq!(ChainQuery::parse("0xzz"), ChainQuery::Text("0xzz".to_string()));
        assert_eq!(ChainQuery::parse("1.5"), ChainQuery::Text("1.5".to_string()));
        assert_eq!(ChainQuery::parse(""), ChainQuery::Text(String::new()));
    }

    #[test]
    fn from_u64_keeps_numeric_ids() {
        assert_eq!(ChainQuery::from(8453u64), ChainQuery::Numeric(8453));
        assert_eq!(
            ChainQuery::from(u64::MAX),
            ChainQuery::Numeric(i128::from(u64::MAX))
        );
    }

    #[test]
    fn large_integers_stay_numeric() {
        assert_eq!(
            ChainQuery::parse("18446744073709551615"),
            ChainQuery::Numeric(i128::from(u64::MAX))
        );
        assert_eq!(
            ChainQuery::parse("9223372036854775808"),
            ChainQuery::Numeric(i128::from(i64::MAX) + 1)
        );
        assert_eq!(
            ChainQuery::parse("0xffffffffffffffff"),
            ChainQuery::Numeric(i128::from(u64::MAX))
        );

        // 超出 i128 的整数仍是数字查询
        let huge = "9".repeat(50);
        let huge_hex = format!("0x{}", "f".repeat(40));
        assert_eq!(ChainQuery::parse(&huge), ChainQuery::Numeric(i128::MAX));
        assert_eq!(ChainQuery::parse(&format!("-{}", huge)), ChainQuery::Numeric(i128::MIN));
        assert_eq!(ChainQuery::parse(&huge_hex), ChainQuery::Numeric(i128::MAX));
    }

    #[test]
    fn signs_after_hex_prefix_are_text() {
        assert_eq!(ChainQuery::parse("0x-5"), ChainQuery::Text("0x-5".to_string()));
        assert_eq!(ChainQuery::parse("0x+5"), ChainQuery::Text("0x+5".to_string()));
        assert_eq!(ChainQuery::parse("0x"), ChainQuery::Text("0x".to_string()));
        assert_eq!(ChainQuery::parse("-"), ChainQuery::Text("-".to_string()));
    }
}
