//! Field-name alias tables for the known website form templates
//!
//! Each form template the website has shipped uses its own field names.
//! For every canonical field we keep an ordered list of acceptable aliases;
//! lookup takes the first alias with a non-empty value. Field names are
//! matched case-insensitively. Unknown form ids fall back to the combined
//! default table.

/// Ordered alias lists for one form template
pub struct FormAliases {
    pub first_name: &'static [&'static str],
    pub last_name: &'static [&'static str],
    pub email: &'static [&'static str],
    pub phone: &'static [&'static str],
    pub message: &'static [&'static str],
    pub source_url: &'static [&'static str],
}

/// Form 1: the original "Contact us" template
static FORM_CONTACT: FormAliases = FormAliases {
    first_name: &["first-name", "name"],
    last_name: &["last-name"],
    email: &["email", "e-mail"],
    phone: &["phone", "phone-number"],
    message: &["message"],
    source_url: &["pageurl", "page-url"],
};

/// Form 2: the property enquiry template
static FORM_PROPERTY_ENQUIRY: FormAliases = FormAliases {
    first_name: &["firstname"],
    last_name: &["surname"],
    email: &["email"],
    phone: &["phone", "mobile"],
    message: &["message", "enquiry"],
    source_url: &["pageurl", "page-url"],
};

/// Form 3: the callback-request template (single combined name field)
static FORM_CALLBACK: FormAliases = FormAliases {
    first_name: &["full-name", "name"],
    last_name: &[],
    email: &["email"],
    phone: &["phone", "tel"],
    message: &["comments", "message"],
    source_url: &["pageurl"],
};

/// Fallback table: the full alias list for every field, for submissions
/// from unrecognized or absent form ids
static FORM_DEFAULT: FormAliases = FormAliases {
    first_name: &["firstname", "first-name", "first_name", "full-name", "name"],
    last_name: &["surname", "lastname", "last-name", "last_name"],
    email: &["email", "e-mail", "email-address"],
    phone: &["phone", "phone-number", "tel", "mobile"],
    message: &["message", "comments", "enquiry"],
    source_url: &["pageurl", "page-url", "page_url", "sourceurl"],
};

/// Resolve the alias table for a form id
pub fn aliases_for(form_id: Option<i32>) -> &'static FormAliases {
    match form_id {
        Some(1) => &FORM_CONTACT,
        Some(2) => &FORM_PROPERTY_ENQUIRY,
        Some(3) => &FORM_CALLBACK,
        _ => &FORM_DEFAULT,
    }
}

/// First alias (in priority order) with a non-empty value, trimmed
pub fn first_non_empty(aliases: &[&str], fields: &[(String, String)]) -> Option<String> {
    for alias in aliases {
        for (name, value) in fields {
            if name.trim().eq_ignore_ascii_case(alias) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
