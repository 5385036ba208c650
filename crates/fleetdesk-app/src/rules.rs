// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

/// Declarative field predicate. Empty values always pass: whether a field
/// may be empty is decided by its `required` flag, not by its rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    MaxLength { max: usize },
    MinLength { min: usize },
    Digits { max: Option<usize> },
    Integer,
    Decimal { places: Option<usize> },
    Email,
    Phone,
    Range { min: Option<f64>, max: Option<f64> },
    OneOf { values: Vec<String> },
    AllOf { rules: Vec<Rule> },
}

impl Rule {
    pub fn accepts(&self, value: &Value) -> bool {
        let text = value_text(value);
        let text = text.trim();
        if text.is_empty() {
            return true;
        }

        match self {
            Self::MaxLength { max } => text.chars().count() <= *max,
            Self::MinLength { min } => text.chars().count() >= *min,
            Self::Digits { max } => {
                text.chars().all(|ch| ch.is_ascii_digit())
                    && max.is_none_or(|max| text.chars().count() <= max)
            }
            Self::Integer => is_integer(text),
            Self::Decimal { places } => is_decimal(text, *places),
            Self::Email => is_email(text),
            Self::Phone => is_phone(text),
            Self::Range { min, max } => match text.parse::<f64>() {
                Ok(number) if number.is_finite() => {
                    min.is_none_or(|min| number >= min) && max.is_none_or(|max| number <= max)
                }
                _ => false,
            },
            Self::OneOf { values } => values.iter().any(|allowed| allowed == text),
            Self::AllOf { rules } => rules.iter().all(|rule| rule.accepts(value)),
        }
    }
}

/// Renders a JSON value the way a text input would hold it.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

fn is_decimal(text: &str, places: Option<usize>) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    if whole.is_empty() && fraction.is_none_or(str::is_empty) {
        return false;
    }
    if !whole.chars().all(|ch| ch.is_ascii_digit()) {
        return false;
    }
    match fraction {
        None => true,
        Some(fraction) => {
            fraction.chars().all(|ch| ch.is_ascii_digit())
                && places.is_none_or(|places| fraction.len() <= places)
        }
    }
}

fn is_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.len() >= 2
}

fn is_phone(text: &str) -> bool {
    let allowed = text
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, ' ' | '+' | '-' | '(' | ')'));
    let digits = text.chars().filter(char::is_ascii_digit).count();
    allowed && (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
}

#[cfg(test)]
mod tests {
    use super::{Rule, value_text};
    use serde_json::json;

    #[test]
    fn empty_values_pass_every_rule() {
        let rules = [
            Rule::MinLength { min: 3 },
            Rule::Email,
            Rule::Phone,
            Rule::Integer,
            Rule::Range {
                min: Some(1.0),
                max: None,
            },
        ];
        for rule in rules {
            assert!(rule.accepts(&json!("")), "{rule:?}");
            assert!(rule.accepts(&json!(null)), "{rule:?}");
        }
    }

    #[test]
    fn digits_rule_caps_length() {
        let rule = Rule::Digits { max: Some(4) };
        assert!(rule.accepts(&json!("1234")));
        assert!(!rule.accepts(&json!("12345")));
        assert!(!rule.accepts(&json!("12a4")));
    }

    #[test]
    fn decimal_rule_accepts_partial_input_and_limits_places() {
        let rule = Rule::Decimal { places: Some(2) };
        assert!(rule.accepts(&json!("12.")));
        assert!(rule.accepts(&json!("12.50")));
        assert!(rule.accepts(&json!(3.5)));
        assert!(!rule.accepts(&json!("12.505")));
        assert!(!rule.accepts(&json!("1,5")));
        assert!(!rule.accepts(&json!(".")));
    }

    #[test]
    fn email_rule_requires_domain_with_tld() {
        assert!(Rule::Email.accepts(&json!("ana@flota.mx")));
        assert!(!Rule::Email.accepts(&json!("ana@flota")));
        assert!(!Rule::Email.accepts(&json!("ana flota@x.mx")));
        assert!(!Rule::Email.accepts(&json!("@flota.mx")));
    }

    #[test]
    fn phone_rule_counts_digits() {
        assert!(Rule::Phone.accepts(&json!("+52 (55) 1234-5678")));
        assert!(!Rule::Phone.accepts(&json!("12345")));
        assert!(!Rule::Phone.accepts(&json!("555-CALL-NOW")));
    }

    #[test]
    fn range_and_one_of_rules() {
        let range = Rule::Range {
            min: Some(0.0),
            max: Some(100.0),
        };
        assert!(range.accepts(&json!(50)));
        assert!(!range.accepts(&json!("-1")));
        assert!(!range.accepts(&json!("abc")));

        let one_of = Rule::OneOf {
            values: vec!["gerente".to_owned(), "operador".to_owned()],
        };
        assert!(one_of.accepts(&json!("operador")));
        assert!(!one_of.accepts(&json!("admin")));
    }

    #[test]
    fn all_of_requires_every_rule() {
        let rule = Rule::AllOf {
            rules: vec![Rule::Digits { max: None }, Rule::MinLength { min: 5 }],
        };
        assert!(rule.accepts(&json!("12345")));
        assert!(!rule.accepts(&json!("1234")));
    }

    #[test]
    fn rules_deserialize_from_tagged_toml() -> anyhow::Result<()> {
        let rule: Rule = toml::from_str("kind = \"digits\"\nmax = 10\n")?;
        assert_eq!(rule, Rule::Digits { max: Some(10) });
        let unit: Rule = toml::from_str("kind = \"email\"\n")?;
        assert_eq!(unit, Rule::Email);
        Ok(())
    }

    #[test]
    fn value_text_matches_input_rendering() {
        assert_eq!(value_text(&json!(null)), "");
        assert_eq!(value_text(&json!(12)), "12");
        assert_eq!(value_text(&json!(true)), "true");
    }
}
