use sha2::{Digest, Sha256};

/// Password accepted under [`crate::config::FinalUnlockPolicy::DerivedPassword`].
///
/// `"axis-"` followed by the first ten hex digits of
/// `sha256(name | sorted tokens joined by "|")`.
pub fn derive_final_password(name: &str, tokens: &[String]) -> String {
    let mut sorted: Vec<&str> = tokens.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let material = format!("{name}|{}", sorted.join("|"));
    let digest = hex::encode(Sha256::digest(material.as_bytes()));
    format!("axis-{}", &digest[..10])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_order_does_not_matter() {
        let a = derive_final_password("Ada", &["b".into(), "a".into()]);
        let b = derive_final_password("Ada", &["a".into(), "b".into()]);
        assert_eq!(a, b);
        assert!(a.starts_with("axis-"));
        assert_eq!(a.len(), "axis-".len() + 10);
    }

    #[test]
    fn matches_known_digest() {
        let expected = {
            let digest = hex::encode(Sha256::digest(b"Ada|"));
            format!("axis-{}", &digest[..10])
        };
        assert_eq!(derive_final_password("Ada", &[]), expected);
        assert_ne!(derive_final_password("Bob", &[]), expected);
    }
}
