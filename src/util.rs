use {
    anyhow::Result,
    serde::{
        de::DeserializeOwned,
        Serialize,
    },
    std::{
        fs::{
            read_to_string,
            File,
        },
        io::Write,
        path::Path,
    },
};


/// Write any serializable config to `path` as pretty ron.
pub fn write_config<C, P>(
    config: &C,
    path: P,
) -> Result<()>
where
    C: Serialize,
    P: AsRef<Path>,
{
    File::create(path)?.write_all(
        ron::ser::to_string_pretty(
            config,
            ron::ser::PrettyConfig::default(),
        )?.as_bytes()
    )?;
    Ok(())
}

/// Read a config previously written with [`write_config`].
pub fn read_config<C, P>(path: P) -> Result<C>
where
    C: DeserializeOwned,
    P: AsRef<Path>,
{
    Ok(ron::from_str(&read_to_string(path)?)?)
}
