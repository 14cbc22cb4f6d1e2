//! # Object Layer
//!
//! Purpose: Store and fetch structured values as serialized text blobs
//! under origin-scoped keys, with a reserved `settings` slot per origin.
//!
//! Absence is not failure here: fetching a key that was never written
//! succeeds and leaves the caller's value untouched, so callers
//! pre-populate defaults and read over them.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::serialize::Serializer;
use crate::store::Store;

impl<S: Store, Z: Serializer> Client<S, Z> {
    /// Saves `value` as a text blob under `name:version:origin:key`.
    ///
    /// Serialization failures return before any network round trip.
    pub fn save_object<T: Serialize>(&self, origin: &str, key: &str, value: &T) -> Result<()> {
        let text = self.serializer.marshal(value)?;
        self.execute("SET", &self.with_origin(origin, key), &[text.as_bytes()])?;
        Ok(())
    }

    /// Loads the blob at `name:version:origin:key` into `out`.
    ///
    /// A missing key returns `Ok(())` with `out` untouched. Everything
    /// else, including a blob that no longer decodes into `T`, is an
    /// error.
    pub fn get_object<T: DeserializeOwned>(
        &self,
        origin: &str,
        key: &str,
        out: &mut T,
    ) -> Result<()> {
        let reply = self.execute("GET", &self.with_origin(origin, key), &[])?;
        let raw = match reply.into_bytes() {
            Ok(raw) => raw,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err),
        };

        let text =
            String::from_utf8(raw).map_err(|err| Error::Deserialization(err.to_string()))?;
        *out = self.serializer.unmarshal(&text)?;
        Ok(())
    }

    /// Saves `value` under the origin's reserved settings slot:
    /// `name:version:origin:settings`.
    pub fn save_settings<T: Serialize>(&self, origin: &str, value: &T) -> Result<()> {
        self.save_object(origin, &self.config.settings_key, value)
    }

    /// Loads the origin's settings slot into `out`; untouched when the
    /// slot was never written.
    pub fn get_settings<T: DeserializeOwned>(&self, origin: &str, out: &mut T) -> Result<()> {
        self.get_object(origin, &self.config.settings_key, out)
    }
}
