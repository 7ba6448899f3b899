//! Client SDK for the SAFE Launcher REST API.
//!
//! The launcher is a local daemon fronting the SAFE decentralized storage
//! network. This crate turns method calls into authenticated — and, in the
//! secure protocol variant, end-to-end encrypted — HTTP requests against
//! it: session/token lifecycle, the negotiated symmetric channel, handle
//! management for launcher-side resources, and the NFS/DNS wrappers on top.
//!
//! ```no_run
//! use safenet::{AppIdentity, LauncherClient};
//!
//! # async fn demo() -> safenet::Result<()> {
//! let app = AppIdentity::new("Demo App", "0.1.0", "Example Vendor", "org.example.demo")
//!     .with_permissions(vec![]);
//! let client = LauncherClient::new(app)?;
//!
//! client.create_directory("/photos", Default::default()).await?;
//! let listing = client.get_directory("/photos", false).await?;
//! println!("{} files", listing.files.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod dns;
pub mod error;
pub mod handles;
pub mod nfs;
pub mod session;
pub mod types;

pub use client::LauncherClient;
pub use config::{LauncherConfig, Protocol};
pub use credentials::CredentialStore;
pub use crypto::{KeyExchange, SecureChannel};
pub use error::{Error, Result};
pub use handles::{CipherOptsKind, HandleKind, RemoteHandle};
pub use nfs::{CreateOptions, ReadOptions};
pub use session::SessionManager;
pub use types::{AppIdentity, Credentials, DirectoryInfo, DirectoryResponse, FileInfo};
