use serde::{Deserialize, Serialize};

use crate::constants::GPT_PARTITION_NAME_MAX_LENGTH;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GptNameError {
    #[error("name ({name}) is too long ({length} > {max})")]
    TooLong {
        name: String,
        length: usize,
        max: usize,
    },

    #[error("name ({name}) contains a non-ASCII character ({character})")]
    NonAscii { name: String, character: char },

    #[error("name ({name}) contains a NUL character")]
    ContainsNul { name: String },
}

/// Checks that `name` can be stored in a GPT partition entry.
///
/// The name field holds 36 UTF-16 code units including the NUL terminator.
/// Only ASCII is accepted so that the character count matches the encoded
/// length.
pub fn validate_gpt_name(name: &str) -> Result<(), GptNameError> {
    if let Some(character) = name.chars().find(|c| !c.is_ascii()) {
        return Err(GptNameError::NonAscii {
            name: name.to_owned(),
            character,
        });
    }

    if name.contains('\0') {
        return Err(GptNameError::ContainsNul {
            name: name.to_owned(),
        });
    }

    if name.len() > GPT_PARTITION_NAME_MAX_LENGTH {
        return Err(GptNameError::TooLong {
            name: name.to_owned(),
            length: name.len(),
            max: GPT_PARTITION_NAME_MAX_LENGTH,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_gpt_name() {
        validate_gpt_name("").unwrap();
        validate_gpt_name("rootfs").unwrap();
        validate_gpt_name(&"a".repeat(35)).unwrap();

        assert_eq!(
            validate_gpt_name(&"a".repeat(36)).unwrap_err().to_string(),
            format!("name ({}) is too long (36 > 35)", "a".repeat(36))
        );
        assert_eq!(
            validate_gpt_name("root🍰").unwrap_err().to_string(),
            "name (root🍰) contains a non-ASCII character (🍰)"
        );
        assert_eq!(
            validate_gpt_name("a\0b").unwrap_err(),
            GptNameError::ContainsNul {
                name: "a\0b".into()
            }
        );
    }
}
