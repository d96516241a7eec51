//! Authentication messages and password hashing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::protocol::builder::MessageBuilder;

/// SASL mechanism implemented by [`ScramClient`].
pub const SCRAM_SHA_256: &str = "SCRAM-SHA-256";

/// Write a PasswordMessage (cleartext or MD5 hashed password).
pub fn write_password(buf: &mut MessageBuilder, password: &str) {
    buf.start_message(super::msg_type::PASSWORD);
    buf.write_cstr(password);
    buf.close_message();
}

/// Compute MD5 password hash.
///
/// PostgreSQL MD5 password format: "md5" + md5(md5(password + username) + salt)
pub fn md5_password(username: &str, password: &str, salt: &[u8; 4]) -> String {
    use md5::Md5;

    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hasher.update(username.as_bytes());
    let first_hash_hex = format!("{:x}", hasher.finalize());

    let mut hasher = Md5::new();
    hasher.update(first_hash_hex.as_bytes());
    hasher.update(salt);

    format!("md5{:x}", hasher.finalize())
}

/// Write a SASLInitialResponse message.
///
/// mechanism: SASL mechanism name (e.g., "SCRAM-SHA-256")
/// initial_response: Client-first-message for SCRAM
pub fn write_sasl_initial_response(
    buf: &mut MessageBuilder,
    mechanism: &str,
    initial_response: &[u8],
) {
    buf.start_message(super::msg_type::PASSWORD);
    buf.write_cstr(mechanism);
    let slot = buf.reserve_size();
    buf.write_bytes(initial_response);
    buf.set_computed_size(slot);
    buf.close_message();
}

/// Write a SASLResponse message.
///
/// response: Client-final-message for SCRAM
pub fn write_sasl_response(buf: &mut MessageBuilder, response: &[u8]) {
    buf.start_message(super::msg_type::PASSWORD);
    buf.write_bytes(response);
    buf.close_message();
}

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| Error::Auth(format!("HMAC error: {e}")))?;
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// GS2 header for SCRAM without channel binding.
const GS2_HEADER: &str = "n,,";

/// SCRAM-SHA-256 client implementation.
pub struct ScramClient {
    /// Client nonce
    nonce: String,
    /// Username sent in client-first-message (PostgreSQL ignores it)
    username: String,
    password: String,
    /// Auth message for signature verification
    auth_message: Option<String>,
    /// Salted password for server signature verification
    salted_password: Option<[u8; 32]>,
}

impl ScramClient {
    /// Create a new SCRAM client.
    pub fn new(password: &str) -> Self {
        Self::with_nonce(password, random_nonce())
    }

    fn with_nonce(password: &str, nonce: String) -> Self {
        Self {
            nonce,
            username: String::new(),
            password: password.to_string(),
            auth_message: None,
            salted_password: None,
        }
    }

    /// Generate the client-first-message.
    pub fn client_first_message(&self) -> String {
        format!("{GS2_HEADER}{}", self.client_first_message_bare())
    }

    fn client_first_message_bare(&self) -> String {
        format!("n={},r={}", self.username, self.nonce)
    }

    /// Process server-first-message and generate client-final-message.
    pub fn process_server_first(&mut self, server_first: &str) -> Result<String> {
        // r=<nonce>,s=<salt>,i=<iterations>
        let mut combined_nonce = None;
        let mut salt_b64 = None;
        let mut iterations = None;

        for part in server_first.split(',') {
            if let Some(value) = part.strip_prefix("r=") {
                combined_nonce = Some(value);
            } else if let Some(value) = part.strip_prefix("s=") {
                salt_b64 = Some(value);
            } else if let Some(value) = part.strip_prefix("i=") {
                iterations = value.parse::<u32>().ok().filter(|&n| n > 0);
            }
        }

        let missing = |what: &str| Error::Auth(format!("Missing {what} in server-first-message"));
        let combined_nonce = combined_nonce.ok_or_else(|| missing("nonce"))?;
        let salt_b64 = salt_b64.ok_or_else(|| missing("salt"))?;
        let iterations = iterations.ok_or_else(|| missing("iterations"))?;

        if !combined_nonce.starts_with(&self.nonce) {
            return Err(Error::Auth(
                "Server nonce doesn't start with client nonce".into(),
            ));
        }

        let salt = BASE64
            .decode(salt_b64)
            .map_err(|e| Error::Auth(format!("Invalid salt: {e}")))?;

        // SaltedPassword = Hi(Normalize(password), salt, iterations)
        let mut salted_password = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            self.password.as_bytes(),
            &salt,
            iterations,
            &mut salted_password,
        );

        let client_key = hmac_sha256(&salted_password, b"Client Key")?;
        let stored_key = Sha256::digest(client_key);

        let channel_binding_b64 = BASE64.encode(GS2_HEADER);
        let client_final_without_proof = format!("c={channel_binding_b64},r={combined_nonce}");

        let auth_message = format!(
            "{},{},{}",
            self.client_first_message_bare(),
            server_first,
            client_final_without_proof
        );

        let client_signature = hmac_sha256(&stored_key, auth_message.as_bytes())?;

        // ClientProof = ClientKey XOR ClientSignature
        let mut client_proof = [0u8; 32];
        for ((proof, key), sig) in client_proof
            .iter_mut()
            .zip(client_key.iter())
            .zip(client_signature.iter())
        {
            *proof = key ^ sig;
        }

        self.salted_password = Some(salted_password);
        self.auth_message = Some(auth_message);

        Ok(format!(
            "{client_final_without_proof},p={}",
            BASE64.encode(client_proof)
        ))
    }

    /// Verify server-final-message.
    pub fn verify_server_final(&self, server_final: &str) -> Result<()> {
        let server_signature_b64 = server_final
            .strip_prefix("v=")
            .ok_or_else(|| Error::Auth("Invalid server-final-message format".into()))?;

        let server_signature = BASE64
            .decode(server_signature_b64)
            .map_err(|e| Error::Auth(format!("Invalid server signature: {e}")))?;

        let (Some(salted_password), Some(auth_message)) =
            (self.salted_password.as_ref(), self.auth_message.as_ref())
        else {
            return Err(Error::Auth(
                "server-final-message received before server-first-message".into(),
            ));
        };

        let server_key = hmac_sha256(salted_password, b"Server Key")?;
        let expected_signature = hmac_sha256(&server_key, auth_message.as_bytes())?;

        if server_signature.as_slice() != expected_signature.as_slice() {
            return Err(Error::Auth("Server signature verification failed".into()));
        }

        Ok(())
    }
}

fn random_nonce() -> String {
    use rand::Rng;

    let mut nonce_bytes = [0u8; 24];
    rand::rng().fill(&mut nonce_bytes);
    BASE64.encode(nonce_bytes)
}
