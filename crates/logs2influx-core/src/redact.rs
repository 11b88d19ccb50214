/// Show at most a short prefix of a secret, for logs and error messages.
pub fn redact_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len == 0 {
        "(empty)".to_string()
    } else if len <= 8 {
        "****".to_string()
    } else {
        let prefix: String = secret.chars().take(4).collect();
        format!("{}****", prefix)
    }
}
