//! Centralized constants for permissions, default paths, and external tools.

/// Permission mode for the SSH certificate and PKCS#12 bundles.
pub const OWNER_RW_MODE: u32 = 0o600;

/// Permission mode for the secret-store token.
pub const TOKEN_FILE_MODE: u32 = 0o400;

/// Mode bits that must never be set on a materialized credential.
pub const GROUP_WORLD_BITS: u32 = 0o077;

/// Process umask applied at startup.
pub const PROCESS_UMASK: u32 = 0o077;

/// Directory holding ephemeral cert/key pairs.
pub const PRIVATE_DIR_MODE: u32 = 0o700;

pub const DEFAULT_SSH_PUBKEY: &str = "$HOME/.ssh/id_ecdsa.pub";
pub const DEFAULT_SSH_CERT: &str = "$HOME/.ssh/id_ecdsa-cert.pub";
pub const DEFAULT_SSH_KNOWN_HOSTS: &str = "$HOME/.ssh/known_hosts";
pub const DEFAULT_VAULT_TOKEN: &str = "$HOME/.vault-token";
pub const DEFAULT_VMWARE_CERT: &str = "$HOME/vmware-user.pfx";
pub const DEFAULT_BROWSER_CERT: &str = "$HOME/browser-user.pfx";

/// Suffix OpenSSH appends to a private key path to name its certificate.
pub const SSH_CERT_SUFFIX: &str = "-cert.pub";

/// Trust anchor for hosts signed by the event certificate authority.
pub const CERT_AUTHORITY: &str = "@cert-authority *.event.dreamhack.se ecdsa-sha2-nistp521 AAAAE2VjZHNhLXNoYTItbmlzdHA1MjEAAAAIbmlzdHA1MjEAAACFBAC/xT7a8A4Gm1Tf0mpKstqncWsOZpGPKa0lqf7EuYSpWUnx5QLaiP2TcI80AELTw2gP9jzOkpN7/QO91V3edRXGLAGk3NiNZLqvJspYfAnEo9f3/E4GBZf4kcDC93+04SzbFg+qMY3iCmJNaIttUMdQwaR22c+HbOYhaGEFWN3OCa6Erw== vault@tech.dreamhack.se";

/// kubectl user entry the client certificate is stored under.
pub const KUBE_CREDENTIAL_NAME: &str = "dhtech";

pub const SSH_ADD: &str = "ssh-add";
pub const KUBECTL: &str = "kubectl";
pub const OPENSSL: &str = "openssl";

/// Default bound on any single external tool invocation (seconds).
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Config file location relative to the user config directory.
pub const CONFIG_DIR_NAME: &str = "prodaccess";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Prefix for ephemeral cert/key directories.
pub const TEMP_PREFIX: &str = "prodaccess-";
