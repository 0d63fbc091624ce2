use std::path::PathBuf;

use clap::Parser;

use crate::storage::S3StorageConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Floor-plan store and change feed")]
pub struct Args {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// Directory for plan files when no bucket is configured.
    #[arg(long, env = "FLOORPLAN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, env = "FLOORPLAN_PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,
    /// Keep everything in memory; nothing survives a restart.
    #[arg(long, env = "FLOORPLAN_MEMORY_STORAGE", default_value_t = false)]
    pub memory_storage: bool,
    #[arg(long, env = "FLOORPLAN_S3_BUCKET")]
    pub s3_bucket: Option<String>,
    #[arg(long, env = "FLOORPLAN_S3_PREFIX")]
    pub s3_prefix: Option<String>,
    #[arg(long, env = "FLOORPLAN_S3_REGION")]
    pub s3_region: Option<String>,
    #[arg(long, env = "FLOORPLAN_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,
    #[arg(long, env = "FLOORPLAN_S3_FORCE_PATH_STYLE", default_value_t = false)]
    pub s3_force_path_style: bool,
    #[arg(long, env = "FLOORPLAN_S3_ACCESS_KEY_ID")]
    pub s3_access_key_id: Option<String>,
    #[arg(long, env = "FLOORPLAN_S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub s3_secret_access_key: Option<String>,
    #[arg(
        long,
        env = "FLOORPLAN_GEOCODER_URL",
        default_value = "https://nominatim.openstreetmap.org"
    )]
    pub geocoder_url: String,
    #[arg(long, env = "FLOORPLAN_BACKUP_SECS", default_value_t = 60)]
    pub backup_interval_secs: u64,
    #[arg(long, env = "FLOORPLAN_TLS_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,
    #[arg(long, env = "FLOORPLAN_TLS_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,
}

pub enum StorageChoice {
    Memory,
    File(PathBuf),
    S3(S3StorageConfig),
}

impl Args {
    pub fn storage_choice(&self) -> StorageChoice {
        if self.memory_storage {
            return StorageChoice::Memory;
        }
        if let Some(bucket) = &self.s3_bucket {
            let mut config = S3StorageConfig::new(bucket.clone());
            config.prefix = self.s3_prefix.clone();
            config.region = self.s3_region.clone();
            config.endpoint_url = self.s3_endpoint.clone();
            config.force_path_style = self.s3_force_path_style;
            config.access_key_id = self.s3_access_key_id.clone();
            config.secret_access_key = self.s3_secret_access_key.clone();
            return StorageChoice::S3(config);
        }
        StorageChoice::File(
            self.data_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../plans")),
        )
    }

    pub fn public_dir(&self) -> PathBuf {
        self.public_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_selects_s3() {
        let args = Args::parse_from([
            "floorplan_server",
            "--s3-bucket",
            "plans",
            "--s3-prefix",
            "/expo/",
            "--port",
            "8080",
        ]);
        assert_eq!(args.port, 8080);
        match args.storage_choice() {
            StorageChoice::S3(config) => {
                assert_eq!(config.bucket, "plans");
                assert_eq!(config.prefix.as_deref(), Some("/expo/"));
            }
            _ => panic!("expected s3 storage"),
        }
    }

    #[test]
    fn memory_flag_wins() {
        let args = Args::parse_from(["floorplan_server", "--memory-storage", "--s3-bucket", "x"]);
        assert!(matches!(args.storage_choice(), StorageChoice::Memory));
    }

    #[test]
    fn tls_needs_both_files() {
        let result = Args::try_parse_from(["floorplan_server", "--tls-cert", "cert.pem"]);
        assert!(result.is_err());
    }
}
