/// Hardware address identifying one peripheral.
///
/// Used as the connection pool key; the stored form is upper-cased so that
/// differently-cased spellings of the same address share one pool entry.
#[derive(Debug, Clone, Eq, PartialEq, Hash, derive_more::Display)]
#[display("{_0}")]
pub struct PeripheralAddress(String);

impl PeripheralAddress {
    /// Creates a canonical peripheral address.
    ///
    /// ```
    /// use blegate::PeripheralAddress;
    ///
    /// let address = PeripheralAddress::new("aa:bb:cc:dd:ee:ff");
    /// assert_eq!("AA:BB:CC:DD:EE:FF", address.as_str());
    /// ```
    #[must_use]
    pub fn new(address: impl AsRef<str>) -> Self {
        Self(address.as_ref().trim().to_ascii_uppercase())
    }

    /// Returns the canonical address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeripheralAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Opaque identifier of one live transport link.
///
/// A fresh link gets a fresh identifier, so peer-disconnect events for an
/// already-evicted link never match a newer connection to the same address.
#[derive(Debug, Clone, Eq, PartialEq, Hash, derive_more::Display)]
#[display("{_0}")]
pub struct LinkId(String);

impl LinkId {
    /// Creates a link identifier from transport-native text.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Link status of one pooled connection.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConnectionStatus {
    /// No live link; the entry was just created.
    Disconnected,
    /// The connect handshake is outstanding.
    Connecting,
    /// The link is up and the command characteristic is resolved.
    Connected,
}
