use std::str::FromStr;

use serde::Deserialize;

pub(crate) mod database;
pub(crate) mod general;

lazy_static::lazy_static! {
    static ref RE_NAME_ENV: regex::Regex = regex::Regex::new(r"\$\{(?<env_name>\w+)}").unwrap();
}

fn get_env_var<T>(env_var_name: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Debug,
{
    let var = dotenv::var(env_var_name).map_err(|err| {
        anyhow::anyhow!(
            "Failed to get env var: {:?}. Error: {:?}",
            env_var_name,
            err
        )
    })?;
    var.parse::<T>().map_err(|err| {
        anyhow::anyhow!(
            "Failed to parse env var: {:?}. Error: {:?}",
            env_var_name,
            err
        )
    })
}

/// Accepts either a literal value or a `${ENV_NAME}` placeholder
fn deserialize_data_or_env<'de, D, T>(data: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + FromStr,
    <T as FromStr>::Err: std::fmt::Debug,
{
    let value = serde_json::Value::deserialize(data)?;
    if let serde_json::Value::String(value) = &value {
        if let Some(caps) = RE_NAME_ENV.captures(value) {
            return get_env_var::<T>(&caps["env_name"]).map_err(serde::de::Error::custom);
        }
    }
    serde_json::from_value::<T>(value).map_err(serde::de::Error::custom)
}

fn deserialize_optional_data_or_env<'de, D, T>(data: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + FromStr,
    <T as FromStr>::Err: std::fmt::Debug,
{
    Ok(match deserialize_data_or_env(data) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("Failed to deserialize_optional_data_or_env: {:?}", err);
            None
        }
    })
}

pub(crate) fn required_value<T>(field_name: &str, value: Option<T>) -> anyhow::Result<T> {
    value.ok_or_else(|| anyhow::anyhow!("Value for `{}` is required but not provided", field_name))
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommonConfig {
    #[serde(default)]
    pub general: general::CommonGeneralConfig,
    #[serde(default)]
    pub database: database::CommonDatabaseConfig,
}
