//! Round settlement: decrypt the master draw and every pending user draw,
//! and decide which ones match.
//!
//! Ciphertexts are never compared directly since PKCS#1 v1.5 padding is
//! randomized. Each draw is decrypted with its owner's key and the parsed
//! numbers are compared.

use std::collections::HashMap;

use rsa::RsaPrivateKey;
use thiserror::Error;

use crate::crypto::{self, CryptoError};
use crate::db::{DrawOutcome, DrawRecord};
use crate::domain::{DomainError, DrawId, DrawNumbers, UserId};

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("No private key stored for user {0}")]
    MissingKey(UserId),

    #[error("Draw {draw_id} could not be decrypted: {source}")]
    Undecryptable {
        draw_id: DrawId,
        #[source]
        source: CryptoError,
    },

    #[error("Draw {draw_id} is malformed: {source}")]
    Malformed {
        draw_id: DrawId,
        #[source]
        source: DomainError,
    },
}

/// Result of comparing one round, ready to be written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub winning_numbers: DrawNumbers,
    pub outcomes: Vec<DrawOutcome>,
    /// Winning draws with their owners, in submission order.
    pub winners: Vec<(DrawId, UserId)>,
}

/// Parsed private keys, one per owner, parsed lazily.
struct KeyRing<'a> {
    pems: &'a HashMap<UserId, String>,
    parsed: HashMap<UserId, RsaPrivateKey>,
}

impl<'a> KeyRing<'a> {
    fn new(pems: &'a HashMap<UserId, String>) -> Self {
        Self {
            pems,
            parsed: HashMap::new(),
        }
    }

    fn decrypt(&mut self, draw: &DrawRecord) -> Result<DrawNumbers, SettlementError> {
        let owner = draw.user_id;
        if !self.parsed.contains_key(&owner) {
            let pem = self
                .pems
                .get(&owner)
                .ok_or(SettlementError::MissingKey(owner))?;
            let key = crypto::parse_private_key(pem).map_err(|source| {
                SettlementError::Undecryptable {
                    draw_id: draw.id,
                    source,
                }
            })?;
            self.parsed.insert(owner, key);
        }

        let key = &self.parsed[&owner];
        let plaintext = crypto::decrypt_with(key, &draw.ciphertext).map_err(|source| {
            SettlementError::Undecryptable {
                draw_id: draw.id,
                source,
            }
        })?;

        DrawNumbers::from_canonical(&plaintext).map_err(|source| SettlementError::Malformed {
            draw_id: draw.id,
            source,
        })
    }
}

/// Compares every pending draw against the master draw. Any draw that cannot
/// be read fails the whole round. CPU heavy; call from a blocking task.
pub fn compare_draws(
    master: &DrawRecord,
    pending: &[DrawRecord],
    private_keys: &HashMap<UserId, String>,
) -> Result<Settlement, SettlementError> {
    let mut keys = KeyRing::new(private_keys);
    let winning_numbers = keys.decrypt(master)?;

    let mut outcomes = Vec::with_capacity(pending.len());
    let mut winners = Vec::new();

    for draw in pending {
        let numbers = keys.decrypt(draw)?;
        let matches_master = numbers == winning_numbers;
        if matches_master {
            winners.push((draw.id, draw.user_id));
        }
        outcomes.push(DrawOutcome {
            draw_id: draw.id,
            matches_master,
        });
    }

    Ok(Settlement {
        winning_numbers,
        outcomes,
        winners,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{DrawKeypair, encrypt_draw};
    use std::sync::OnceLock;

    fn keys() -> &'static (DrawKeypair, DrawKeypair) {
        static KEYS: OnceLock<(DrawKeypair, DrawKeypair)> = OnceLock::new();
        KEYS.get_or_init(|| {
            (
                DrawKeypair::generate(1024).unwrap(),
                DrawKeypair::generate(1024).unwrap(),
            )
        })
    }

    fn record(id: i32, owner: i32, keys: &DrawKeypair, numbers: &str, master: bool) -> DrawRecord {
        DrawRecord {
            id: DrawId::new(id),
            user_id: UserId::new(owner),
            ciphertext: encrypt_draw(&keys.public_pem, numbers).unwrap(),
            been_played: false,
            matches_master: false,
            master_draw: master,
            lottery_round: if master { 3 } else { 0 },
            created_at: String::new(),
        }
    }

    fn key_map() -> HashMap<UserId, String> {
        let (admin, user) = keys();
        HashMap::from([
            (UserId::new(1), admin.private_pem.clone()),
            (UserId::new(2), user.private_pem.clone()),
        ])
    }

    #[test]
    fn matching_draws_are_winners() {
        let (admin, user) = keys();
        let master = record(10, 1, admin, "4 8 15 16 23 42", true);
        let pending = vec![
            record(11, 2, user, "4 8 15 16 23 42", false),
            record(12, 2, user, "1 2 3 4 5 6", false),
            record(13, 1, admin, "4 8 15 16 23 42", false),
        ];

        let settlement = compare_draws(&master, &pending, &key_map()).unwrap();

        assert_eq!(settlement.winning_numbers.to_string(), "4 8 15 16 23 42");
        assert_eq!(
            settlement.outcomes,
            vec![
                DrawOutcome {
                    draw_id: DrawId::new(11),
                    matches_master: true
                },
                DrawOutcome {
                    draw_id: DrawId::new(12),
                    matches_master: false
                },
                DrawOutcome {
                    draw_id: DrawId::new(13),
                    matches_master: true
                },
            ]
        );
        assert_eq!(
            settlement.winners,
            vec![
                (DrawId::new(11), UserId::new(2)),
                (DrawId::new(13), UserId::new(1))
            ]
        );
    }

    #[test]
    fn missing_owner_key_fails_the_round() {
        let (admin, user) = keys();
        let master = record(10, 1, admin, "4 8 15 16 23 42", true);
        let pending = vec![record(11, 7, user, "1 2 3 4 5 6", false)];

        let err = compare_draws(&master, &pending, &key_map()).unwrap_err();
        assert!(matches!(err, SettlementError::MissingKey(id) if id == UserId::new(7)));
    }

    #[test]
    fn draw_encrypted_for_someone_else_fails_the_round() {
        let (admin, _) = keys();
        let master = record(10, 1, admin, "4 8 15 16 23 42", true);
        // Stored under user 2 but encrypted with the admin's key.
        let pending = vec![record(11, 2, admin, "1 2 3 4 5 6", false)];

        assert!(compare_draws(&master, &pending, &key_map()).is_err());
    }
}
