//! Random value helpers, mostly used by tests to avoid fixture collisions.

use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

pub fn random_string(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn random_owner() -> String {
    random_string(8)
}

pub fn random_money() -> i64 {
    rand::thread_rng().gen_range(0..=1000)
}

pub fn random_currency() -> String {
    let choices = [super::currency::USD, super::currency::EUR, super::currency::INR];
    choices[rand::thread_rng().gen_range(0..choices.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_string_has_requested_length() {
        assert_eq!(random_string(12).len(), 12);
        assert!(random_string(12).chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn random_currency_is_supported() {
        for _ in 0..10 {
            assert!(super::super::currency::is_supported(&random_currency()));
        }
    }

    #[test]
    fn random_money_is_in_range() {
        for _ in 0..10 {
            let money = random_money();
            assert!((0..=1000).contains(&money));
        }
    }
}
