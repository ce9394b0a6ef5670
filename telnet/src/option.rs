//
// Copyright 2017-2026 Session Hub Contributors. All Rights Reserved.
//
// Licensed under the MIT License. See the LICENSE file in the repository
// root for full license text.
//

use crate::consts::option;

/// The Telnet options this engine negotiates, plus a catch-all for anything
/// else a peer proposes.
///
/// [IANA Telnet Options registry](https://www.iana.org/assignments/telnet-options/telnet-options.xhtml)
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TelnetOption {
    /// Echo (RFC 857).
    Echo,
    /// Suppress Go Ahead (RFC 858).
    SuppressGoAhead,
    /// Terminal Type (RFC 1091).
    Terminal,
    /// Negotiate About Window Size (RFC 1073).
    Naws,
    /// Linemode (RFC 1184).
    Linemode,
    /// Any option code not in the table above.
    Unknown(u8),
}

impl TelnetOption {
    pub fn from_code(code: u8) -> Self {
        match code {
            option::ECHO => Self::Echo,
            option::SGA => Self::SuppressGoAhead,
            option::TERMINAL => Self::Terminal,
            option::NAWS => Self::Naws,
            option::LINEMODE => Self::Linemode,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Echo => option::ECHO,
            Self::SuppressGoAhead => option::SGA,
            Self::Terminal => option::TERMINAL,
            Self::Naws => option::NAWS,
            Self::Linemode => option::LINEMODE,
            Self::Unknown(code) => code,
        }
    }

    /// Human-readable name used by `OptionRegistry::status`.
    pub fn name(self) -> String {
        match self {
            Self::Echo => "ECHO".to_string(),
            Self::SuppressGoAhead => "SGA".to_string(),
            Self::Terminal => "TERMINAL".to_string(),
            Self::Naws => "NAWS".to_string(),
            Self::Linemode => "LINEMODE".to_string(),
            Self::Unknown(code) => format!("UNKNOWN-OPTION-{code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_codes() {
        for opt in [
            TelnetOption::Echo,
            TelnetOption::SuppressGoAhead,
            TelnetOption::Terminal,
            TelnetOption::Naws,
            TelnetOption::Linemode,
        ] {
            assert_eq!(TelnetOption::from_code(opt.code()), opt);
        }
    }

    #[test]
    fn unknown_option_name() {
        assert_eq!(TelnetOption::Unknown(99).name(), "UNKNOWN-OPTION-99");
    }
}
