//! Parent notification links (WhatsApp click-to-chat).

/// Used when an absence record arrives without a message.
pub fn absence_message(student_name: &str) -> String {
    format!(
        "Dear Parent, Your child {student_name} was absent today. Please contact school if needed."
    )
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Contact number has no digits")]
    NoDigits,
}

/// `https://wa.me/<digits>?text=<url-encoded message>`
///
/// The phone is reduced to its digits. A configured country code is
/// prefixed to bare 10-digit numbers.
pub fn whatsapp_link(
    phone: &str,
    message: &str,
    country_code: Option<&str>,
) -> Result<String, NotifyError> {
    let mut digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(NotifyError::NoDigits);
    }

    if let Some(code) = country_code {
        let code: String = code.chars().filter(char::is_ascii_digit).collect();
        if digits.len() == 10 && !code.is_empty() {
            digits.insert_str(0, &code);
        }
    }

    Ok(format!(
        "https://wa.me/{}?text={}",
        digits,
        urlencoding::encode(message)
    ))
}
