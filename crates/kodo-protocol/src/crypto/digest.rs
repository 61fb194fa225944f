use sha1::{Digest, Sha1};

/// SHA-1 proof sent in the auth-session frame, binding the account name,
/// both seeds, and the session key from the realm handshake.
///
/// Layout: account bytes, four zero bytes, client seed LE, server seed LE,
/// session key. The caller passes the account already uppercased; the server
/// hashes the uppercase form, so mixed case here fails authentication.
pub fn session_proof(
    account: &str,
    client_seed: u32,
    server_seed: u32,
    session_key: &[u8],
) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(account.as_bytes());
    hasher.update([0u8; 4]);
    hasher.update(client_seed.to_le_bytes());
    hasher.update(server_seed.to_le_bytes());
    hasher.update(session_key);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_inputs_give_known_digest() {
        let key: Vec<u8> = (0u8..40).collect();
        let proof = session_proof("ALICE", 0x11223344, 0xCAFEBABE, &key);
        assert_eq!(
            proof,
            [
                0xF4, 0x25, 0x75, 0x7E, 0x9C, 0x3C, 0x30, 0x87, 0xB5, 0x17, 0xC0, 0xEF, 0x87,
                0x7D, 0x33, 0x3D, 0x89, 0x06, 0x1D, 0x9C,
            ]
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        let key = [0xABu8; 40];
        let a = session_proof("BOB", 1, 2, &key);
        let b = session_proof("BOB", 1, 2, &key);
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_input_perturbs_the_digest() {
        let key = [0u8; 40];
        let base = session_proof("BOB", 1, 2, &key);
        assert_ne!(base, session_proof("BOC", 1, 2, &key));
        assert_ne!(base, session_proof("BOB", 3, 2, &key));
        assert_ne!(base, session_proof("BOB", 1, 4, &key));
        assert_ne!(base, session_proof("BOB", 1, 2, &[1u8; 40]));
    }
}
