use async_trait::async_trait;
use rand::Rng;

/// Source of display names for guest sessions
#[async_trait]
pub trait UsernameGenerator: Send + Sync {
    async fn generate(&self) -> String;
}

/// `adjective-animal-NNNN` names.
///
/// Room ownership is checked by username, so a numeric tag keeps two guests
/// with the same pet name apart.
pub struct PetNameUsernameGenerator {
    words: u8,
}

impl PetNameUsernameGenerator {
    pub fn new() -> Self {
        Self { words: 2 }
    }
}

impl Default for PetNameUsernameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsernameGenerator for PetNameUsernameGenerator {
    async fn generate(&self) -> String {
        let name = petname::Petnames::default().generate_one(self.words, "-");
        let tag: u16 = rand::rng().random_range(0..10_000);
        format!("{name}-{tag:04}")
    }
}
