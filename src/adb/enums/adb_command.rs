use crate::constants::{AUTH_CODE, CLSE_CODE, CNXN_CODE, OKAY_CODE, OPEN_CODE, WRTE_CODE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AdbCommand {
    Cnxn = CNXN_CODE,
    Auth = AUTH_CODE,
    Open = OPEN_CODE,
    Okay = OKAY_CODE,
    Clse = CLSE_CODE,
    Wrte = WRTE_CODE,
}

impl AdbCommand {
    pub fn code(&self) -> u32 {
        *self as u32
    }
}

impl TryFrom<u32> for AdbCommand {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            CNXN_CODE => Ok(AdbCommand::Cnxn),
            AUTH_CODE => Ok(AdbCommand::Auth),
            OPEN_CODE => Ok(AdbCommand::Open),
            OKAY_CODE => Ok(AdbCommand::Okay),
            CLSE_CODE => Ok(AdbCommand::Clse),
            WRTE_CODE => Ok(AdbCommand::Wrte),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for AdbCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AdbCommand::Cnxn => "CNXN",
            AdbCommand::Auth => "AUTH",
            AdbCommand::Open => "OPEN",
            AdbCommand::Okay => "OKAY",
            AdbCommand::Clse => "CLSE",
            AdbCommand::Wrte => "WRTE",
        };
        write!(f, "{}", name)
    }
}
