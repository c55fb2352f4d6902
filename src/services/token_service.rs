use chrono::Utc;
use tracing::{debug, info};

use super::capabilities::CapabilityTable;
use crate::config::ImagineConfig;
use crate::error::{ImagineError, Result};
use crate::models::{
    ImageVersions, OperationSet, TokenResponse, VariantResponse, VersionHashesResponse,
};
use crate::utils::{
    cache_key, find_token, hash_image_versions, parse_query, serialize, variant_file_name,
    IntegrityHasher, QuerySyntax, Separators,
};

/// Issues and checks tokens for operation specs carried in request queries.
#[derive(Debug, Clone)]
pub struct TokenService {
    hasher: IntegrityHasher,
    separators: Separators,
    syntax: QuerySyntax,
    capabilities: CapabilityTable,
    token_param: String,
    max_operations: Option<usize>,
}

impl TokenService {
    pub fn new(config: &ImagineConfig) -> Result<Self> {
        config.separators.validate()?;
        let hasher = IntegrityHasher::new(
            config.salt.clone(),
            config.hash_length,
            config.hash_algorithm,
        )?;
        let capabilities =
            CapabilityTable::build(&config.model_operations, &config.engine_operations)?;
        if capabilities.is_empty() {
            info!("No operation capabilities configured, every operation name is accepted");
        }

        Ok(Self {
            hasher,
            separators: config.separators.clone(),
            syntax: config.query_syntax.clone(),
            capabilities,
            token_param: config.token_param.clone(),
            max_operations: config.max_operations,
        })
    }

    pub fn token_param(&self) -> &str {
        &self.token_param
    }

    pub fn unpack_params<K, V>(&self, pairs: &[(K, V)]) -> Result<OperationSet>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let operations = parse_query(pairs, &self.token_param, &self.syntax)?;

        if let Some(max) = self.max_operations {
            if operations.len() > max {
                return Err(ImagineError::InvalidInput(format!(
                    "{} operations requested, at most {} allowed",
                    operations.len(),
                    max
                )));
            }
        }
        if !self.capabilities.is_empty() {
            self.capabilities.ensure_supported(&operations)?;
        }
        Ok(operations)
    }

    /// Canonical string and token for the operations in `pairs`.
    pub fn issue<K, V>(&self, pairs: &[(K, V)]) -> Result<TokenResponse>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let operations = self.unpack_params(pairs)?;
        let canonical = serialize(&operations, &self.separators)?;
        let token = self.hasher.hash(&canonical);
        debug!("Issued token for `{}`", canonical);

        Ok(TokenResponse {
            operations,
            canonical,
            token,
            issued_at: Utc::now(),
        })
    }

    /// Recomputes the token for `pairs` and compares it to the one supplied
    /// in the token parameter.
    pub fn check<K, V>(&self, pairs: &[(K, V)]) -> Result<TokenResponse>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let operations = self.unpack_params(pairs)?;
        let canonical = serialize(&operations, &self.separators)?;
        let supplied = find_token(pairs, &self.token_param);
        self.hasher.verify(&canonical, supplied)?;

        Ok(TokenResponse {
            operations,
            token: supplied.unwrap_or_default().to_string(),
            canonical,
            issued_at: Utc::now(),
        })
    }

    /// Checked cache file name for a variant of `base`.
    pub fn variant<K, V>(&self, base: &str, pairs: &[(K, V)]) -> Result<VariantResponse>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let checked = self.check(pairs)?;
        let file_name = variant_file_name(base, &checked.operations, &self.separators)?;
        let etag = format!("\"{}\"", cache_key(&[&file_name, &checked.token]));

        Ok(VariantResponse {
            file_name,
            canonical: checked.canonical,
            etag,
        })
    }

    pub fn version_hashes(
        &self,
        versions: &ImageVersions,
        length: usize,
    ) -> Result<VersionHashesResponse> {
        let hashes = hash_image_versions(versions, &self.separators, length)?;
        Ok(VersionHashesResponse { hashes })
    }
}
