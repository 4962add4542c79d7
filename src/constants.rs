pub const ADB_PROTOCOL_VERSION: u32 = 0x01000000;

pub const DEFAULT_ADB_PORT: u16 = 5555;
pub const DEFAULT_CONNECT_TIMEOUT_S: f64 = 8.0;

pub const ADB_HEADER_SIZE: usize = 24;

// Local maximum payload advertised in CNXN; the peer's CNXN arg1 replaces it.
pub const DEFAULT_MAX_DATA: u32 = 4096;
pub const MIN_MAX_DATA: u32 = 256;

pub const CNXN_BANNER: &str = "host::";

pub const AUTH_TOKEN: u32 = 1;
pub const AUTH_SIGNATURE: u32 = 2;
pub const AUTH_RSA_PUBLIC_KEY: u32 = 3;

pub const SHELL_SERVICE_PREFIX: &str = "shell:";
pub const SYNC_SERVICE: &str = "sync:";

pub const SYNC_SEND: &[u8; 4] = b"SEND";
pub const SYNC_DATA: &[u8; 4] = b"DATA";
pub const SYNC_DONE: &[u8; 4] = b"DONE";
pub const SYNC_OKAY: &[u8; 4] = b"OKAY";
pub const SYNC_FAIL: &[u8; 4] = b"FAIL";

// Four-byte ident plus four-byte length field on every outgoing sync frame.
pub const SYNC_FRAME_OVERHEAD: u32 = 8;

pub const REMOTE_TMP_DIR: &str = "/data/local/tmp";
pub const DEFAULT_FILE_MODE: u32 = 0o644;

pub const ADB_PRIVATE_KEY_FILE: &str = "adbkey";
pub const ADB_PUBLIC_KEY_FILE: &str = "adbkey.pub";
pub const RSA_KEY_BITS: usize = 2048;

pub const PROGRESS_MIN_STEP: u64 = 512 * 1024;

pub const NULL_TERMINATOR: char = '\0';

pub const CNXN_CODE: u32 = 0x4E584E43;
pub const AUTH_CODE: u32 = 0x48545541;
pub const CLSE_CODE: u32 = 0x45534C43;
pub const OKAY_CODE: u32 = 0x59414B4F;
pub const OPEN_CODE: u32 = 0x4E45504F;
pub const WRTE_CODE: u32 = 0x45545257;
