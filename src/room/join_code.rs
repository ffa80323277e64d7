use rand::Rng;

const JOIN_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const JOIN_CODE_LENGTH: usize = 5;

/// Random join code of `JOIN_CODE_LENGTH` upper-case letters and digits
pub fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| JOIN_CODE_CHARSET[rng.random_range(0..JOIN_CODE_CHARSET.len())] as char)
        .collect()
}
