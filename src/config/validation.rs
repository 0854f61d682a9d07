use thiserror::Error;

/// 配置驗證錯誤
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("缺少必要配置項: {0}")]
    MissingField(String),

    #[error("無效的配置值: {0}")]
    InvalidValue(String),

    #[error("配置範圍錯誤: {field} 的值 {value} 不在範圍 {min}..{max} 內")]
    RangeError {
        field: String,
        value: String,
        min: String,
        max: String,
    },
}

/// 配置驗證器trait
pub trait Validator {
    /// 驗證配置
    fn validate(&self) -> Result<(), ValidationError>;
}

/// 驗證配置區段
pub fn validate_config<T>(config: &T) -> Result<(), ValidationError>
where
    T: Validator
{
    config.validate()
}

/// 驗證工具函數
pub struct ValidationUtils;

impl ValidationUtils {
    /// 驗證配置值是否在指定範圍內（含兩端）
    pub fn in_range<T>(
        value: T,
        min: T,
        max: T,
        field_name: &str
    ) -> Result<(), ValidationError>
    where
        T: PartialOrd + ToString
    {
        if value < min || value > max {
            return Err(ValidationError::RangeError {
                field: field_name.to_string(),
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(())
    }

    /// 驗證一個選項是否為某些值中的一個
    pub fn one_of<T>(
        value: &T,
        options: &[T],
        field_name: &str
    ) -> Result<(), ValidationError>
    where
        T: PartialEq + ToString
    {
        if !options.contains(value) {
            return Err(ValidationError::InvalidValue(format!(
                "{} 的值 {} 不是有效選項: {:?}",
                field_name,
                value.to_string(),
                options.iter().map(ToString::to_string).collect::<Vec<_>>()
            )));
        }
        Ok(())
    }

    /// 檢查必要的字串欄位是否有值
    pub fn not_empty(
        value: &str,
        field_name: &str
    ) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(field_name.to_string()));
        }
        Ok(())
    }

    /// 檢查字串中不含空白字元（位址、主機名）
    pub fn no_whitespace(
        value: &str,
        field_name: &str
    ) -> Result<(), ValidationError> {
        if value.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidValue(format!(
                "{} 的值 {:?} 含有空白字元",
                field_name, value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range() {
        // 測試有效範圍
        assert!(ValidationUtils::in_range(8080u16, 1, 65535, "port").is_ok());

        // 測試無效範圍
        let err = ValidationUtils::in_range(0u16, 1, 65535, "port").unwrap_err();
        match err {
            ValidationError::RangeError { field, value, min, max } => {
                assert_eq!(field, "port");
                assert_eq!(value, "0");
                assert_eq!(min, "1");
                assert_eq!(max, "65535");
            },
            _ => panic!("Expected RangeError"),
        }
    }

    #[test]
    fn test_one_of() {
        assert!(ValidationUtils::one_of(&"json", &["pretty", "json"], "log.format").is_ok());
        assert!(ValidationUtils::one_of(&"yaml", &["pretty", "json"], "log.format").is_err());
    }

    #[test]
    fn test_not_empty() {
        assert!(ValidationUtils::not_empty("127.0.0.1", "address").is_ok());

        // 測試空字串
        assert!(ValidationUtils::not_empty("", "address").is_err());
        assert!(ValidationUtils::not_empty("   ", "address").is_err());
    }

    #[test]
    fn test_no_whitespace() {
        assert!(ValidationUtils::no_whitespace("localhost", "address").is_ok());
        assert!(ValidationUtils::no_whitespace("local host", "address").is_err());
        assert!(ValidationUtils::no_whitespace("127.0.0.1\n", "address").is_err());
    }
}
