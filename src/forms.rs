//! Form data accepted by the create/edit and e-mail invitation views.
//!
//! Validation never touches the store; a failed form is rendered back to the
//! user with its errors.

use crate::store::GroupFields;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NAME_MAX_LEN: usize = 80;
pub const DESCRIPTION_MAX_LEN: usize = 2000;
pub const MAX_INVITATIONS_PER_REQUEST: usize = 50;

/// Field name -> messages
pub type FormErrors = BTreeMap<String, Vec<String>>;

fn push_error(errors: &mut FormErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

/// Editable group fields; `members`, `admins`, `creator` and `created` are never accepted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl GroupForm {
    /// Prefill the edit form from an existing group
    pub fn from_fields(fields: &GroupFields) -> Self {
        Self {
            name: fields.name.clone(),
            description: fields.description.clone(),
        }
    }

    pub fn validate(&self) -> Result<GroupFields, FormErrors> {
        let mut errors = FormErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            push_error(&mut errors, "name", "This field is required.");
        } else if name.chars().count() > NAME_MAX_LEN {
            push_error(
                &mut errors,
                "name",
                format!("Ensure this value has at most {} characters.", NAME_MAX_LEN),
            );
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        if let Some(d) = description {
            if d.chars().count() > DESCRIPTION_MAX_LEN {
                push_error(
                    &mut errors,
                    "description",
                    format!(
                        "Ensure this value has at most {} characters.",
                        DESCRIPTION_MAX_LEN
                    ),
                );
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(GroupFields {
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }
}

/// A list of addresses separated by commas, semicolons or whitespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailInvitationForm {
    #[serde(default)]
    pub emails: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl EmailInvitationForm {
    /// Normalized, de-duplicated addresses in input order
    pub fn validate(&self) -> Result<Vec<String>, FormErrors> {
        let mut errors = FormErrors::new();
        let mut addresses: Vec<String> = Vec::new();

        for raw in self
            .emails
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            let address = raw.to_lowercase();
            if !is_valid_email(&address) {
                push_error(
                    &mut errors,
                    "emails",
                    format!("{} is not a valid e-mail address.", raw),
                );
            } else if !addresses.contains(&address) {
                addresses.push(address);
            }
        }

        if addresses.is_empty() && errors.is_empty() {
            push_error(&mut errors, "emails", "This field is required.");
        }
        if addresses.len() > MAX_INVITATIONS_PER_REQUEST {
            push_error(
                &mut errors,
                "emails",
                format!(
                    "At most {} addresses can be invited at once.",
                    MAX_INVITATIONS_PER_REQUEST
                ),
            );
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(addresses)
    }
}

fn is_valid_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_form_trims_and_drops_empty_description() {
        let form = GroupForm {
            name: "  Book club ".to_string(),
            description: Some("   ".to_string()),
        };
        let fields = form.validate().unwrap();
        assert_eq!(fields.name, "Book club");
        assert_eq!(fields.description, None);
    }

    #[test]
    fn test_group_form_requires_name() {
        let errors = GroupForm::default().validate().unwrap_err();
        assert_eq!(errors["name"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn test_group_form_name_too_long() {
        let form = GroupForm {
            name: "x".repeat(NAME_MAX_LEN + 1),
            description: None,
        };
        assert!(form.validate().unwrap_err().contains_key("name"));
    }

    #[test]
    fn test_email_form_splits_and_dedupes() {
        let form = EmailInvitationForm {
            emails: "a@example.com, B@example.com;a@example.com\nc@example.org".to_string(),
            message: None,
        };
        assert_eq!(
            form.validate().unwrap(),
            vec!["a@example.com", "b@example.com", "c@example.org"]
        );
    }

    #[test]
    fn test_email_form_reports_bad_addresses() {
        let form = EmailInvitationForm {
            emails: "good@example.com, nope, also@bad".to_string(),
            message: None,
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors["emails"].len(), 2);
    }

    #[test]
    fn test_email_form_requires_an_address() {
        let errors = EmailInvitationForm::default().validate().unwrap_err();
        assert!(errors.contains_key("emails"));
    }
}
