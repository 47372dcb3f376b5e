use std::str::FromStr;

use mime::Mime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Optional MIME type of an entry, serialized as a plain string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentType(pub Option<Mime>);

impl ContentType {
    pub fn none() -> Self {
        Self(None)
    }

    /// Guess the MIME type from a file name, `None` when nothing matches.
    pub fn guess(name: &str) -> Self {
        Self(mime_guess::from_path(name).first())
    }

    pub fn as_mime(&self) -> Option<&Mime> {
        self.0.as_ref()
    }
}

impl Serialize for ContentType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.0 {
            Some(mime) => serializer.serialize_str(mime.as_ref()),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(s) => {
                let mime = Mime::from_str(&s).map_err(serde::de::Error::custom)?;
                Ok(ContentType(Some(mime)))
            }
            None => Ok(ContentType(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_from_name() {
        assert_eq!(
            ContentType::guess("report.txt").as_mime().map(AsRef::as_ref),
            Some("text/plain")
        );
        assert_eq!(
            ContentType::guess("logo.png").as_mime().map(AsRef::as_ref),
            Some("image/png")
        );
        assert_eq!(ContentType::guess("no-extension"), ContentType::none());
    }

    #[test]
    fn test_serde_roundtrip() {
        let some = ContentType::guess("logo.png");
        let json = serde_json::to_string(&some).unwrap();
        assert_eq!(json, r#""image/png""#);
        let back: ContentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, some);

        let none = ContentType::none();
        let json = serde_json::to_string(&none).unwrap();
        assert_eq!(json, "null");
        let back: ContentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, none);
    }
}
