use base64::{URL_SAFE_NO_PAD, encode_config};
use jwt_simple::prelude::ES256KeyPair;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::config;
use crate::types::push::VapidConfig;

#[derive(Debug, Clone)]
pub struct VapidCredentials {
    pub private_key: String,
    pub public_key: String,
}

#[derive(Debug, Clone)]
pub(crate) enum VapidConfigStatus {
    Missing,
    Incomplete,
    Ready(VapidConfig),
}

pub(crate) fn load_vapid_config(config: &config::AppConfig) -> VapidConfigStatus {
    let private_key = non_blank(config.vapid_private_key.as_deref());
    let public_key = non_blank(config.vapid_public_key.as_deref());
    let subject = non_blank(config.vapid_subject.as_deref());
    let has_any = private_key.is_some() || public_key.is_some() || subject.is_some();

    match (private_key, public_key, subject) {
        (Some(private_key), Some(public_key), Some(subject)) => {
            VapidConfigStatus::Ready(VapidConfig {
                private_key: private_key.to_string(),
                public_key: public_key.to_string(),
                subject: subject.to_string(),
            })
        }
        _ if has_any => VapidConfigStatus::Incomplete,
        _ => VapidConfigStatus::Missing,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn generate_vapid_credentials() -> Result<VapidCredentials, web_push::WebPushError> {
    let mut rng = OsRng;
    generate_vapid_credentials_with_rng(&mut rng)
}

pub(crate) fn generate_vapid_credentials_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<VapidCredentials, web_push::WebPushError> {
    let key_pair = random_es256_keypair(rng);
    let private_key = encode_config(key_pair.to_bytes(), URL_SAFE_NO_PAD);
    let public_key =
        web_push::VapidSignatureBuilder::from_base64_no_sub(&private_key, URL_SAFE_NO_PAD)?
            .get_public_key();

    Ok(VapidCredentials {
        private_key,
        public_key: encode_config(public_key, URL_SAFE_NO_PAD),
    })
}

// Not every 32-byte string is a valid P-256 scalar.
fn random_es256_keypair<R: RngCore + CryptoRng>(rng: &mut R) -> ES256KeyPair {
    let mut key_bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut key_bytes);
        if let Ok(key_pair) = ES256KeyPair::from_bytes(&key_bytes) {
            return key_pair;
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use base64::decode_config;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generate_vapid_credentials_with_rng__should_be_deterministic_for_seed() {
        // Given
        let mut first_rng = StdRng::from_seed([3u8; 32]);
        let mut second_rng = StdRng::from_seed([3u8; 32]);

        // When
        let first = generate_vapid_credentials_with_rng(&mut first_rng).expect("credentials");
        let second = generate_vapid_credentials_with_rng(&mut second_rng).expect("credentials");

        // Then
        assert_eq!(first.private_key, second.private_key);
        assert_eq!(first.public_key, second.public_key);
        let public = decode_config(&first.public_key, URL_SAFE_NO_PAD).expect("decode key");
        assert_eq!(public.len(), 65);
        assert_eq!(public[0], 0x04);
    }

    #[test]
    fn load_vapid_config__should_report_each_state() {
        // Given
        let mut config = config::AppConfig::default();

        // Then
        assert!(matches!(
            load_vapid_config(&config),
            VapidConfigStatus::Missing
        ));

        // When
        config.vapid_private_key = Some("private".to_string());
        config.vapid_public_key = Some("public".to_string());
        config.vapid_subject = Some("   ".to_string());

        // Then
        assert!(matches!(
            load_vapid_config(&config),
            VapidConfigStatus::Incomplete
        ));

        // When
        config.vapid_subject = Some("mailto:ops@washbuddy.example".to_string());

        // Then
        let VapidConfigStatus::Ready(vapid) = load_vapid_config(&config) else {
            panic!("expected ready config");
        };
        assert_eq!(vapid.public_key, "public");
        assert_eq!(vapid.subject, "mailto:ops@washbuddy.example");
    }
}
