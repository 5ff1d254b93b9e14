use crate::{Result, TestInfraError};
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const INIT_SCRIPT_PATH: &str = "/docker-entrypoint-initdb.d/001-init.sql";

/// Settings for a disposable MySQL server.
///
/// The server defaults to `utf8mb4` with a binary collation so string
/// comparisons are case-sensitive, the way short codes compare.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "linkhop".to_string(), setter(into))]
    database: String,
    #[builder(default = "linkhop".to_string(), setter(into))]
    username: String,
    #[builder(default = "linkhop".to_string(), setter(into))]
    password: String,
    #[builder(default = "utf8mb4".to_string(), setter(into))]
    charset: String,
    #[builder(default = "utf8mb4_bin".to_string(), setter(into))]
    collation: String,
    /// SQL run once by the entrypoint before the server accepts clients.
    #[builder(default, setter(strip_option, into))]
    init_sql: Option<String>,
}

impl MysqlConfig {
    pub fn collation(&self) -> &str {
        &self.collation
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("database", &self.database),
            ("username", &self.username),
        ] {
            let valid = !value.is_empty()
                && value
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_');
            if !valid {
                return Err(TestInfraError::InvalidConfig(format!(
                    "{field} must be a non-empty identifier, got '{value}'"
                )));
            }
        }
        Ok(())
    }
}

/// Test fixture for a disposable MySQL server.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    /// Starts a MySQL container suitable for integration tests.
    ///
    /// Readiness waits for the listener on 3306, which only comes up after
    /// the entrypoint has run `init_sql` against its temporary server.
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        config.validate()?;

        let mut request = GenericImage::new("mysql", "8.4")
            .with_exposed_port(3306_u16.tcp())
            .with_wait_for(WaitFor::message_on_stderr("port: 3306"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .with_cmd([
                format!("--character-set-server={}", config.charset),
                format!("--collation-server={}", config.collation),
            ]);
        if let Some(sql) = &config.init_sql {
            request = request.with_copy_to(INIT_SCRIPT_PATH, sql.clone().into_bytes());
        }

        let container = request.start().await?;
        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        let host = self.container.get_host().await?.to_string();

        match host.as_str() {
            "localhost" => Ok(String::from("127.0.0.1")),
            _ => Ok(host),
        }
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(3306).await?)
    }

    /// Connection URL for the application user, e.g. for `MySqlPool::connect`.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }

    pub fn config(&self) -> &MysqlConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_a_binary_utf8mb4_collation() {
        let config = MysqlConfig::builder().build();
        assert_eq!(config.charset, "utf8mb4");
        assert_eq!(config.collation(), "utf8mb4_bin");
        assert!(config.init_sql.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn identifiers_are_validated_before_they_reach_the_url() {
        for database in ["", "links;drop", "a/b"] {
            let config = MysqlConfig::builder().database(database).build();
            assert!(
                matches!(config.validate(), Err(TestInfraError::InvalidConfig(_))),
                "{database}"
            );
        }
    }
}
