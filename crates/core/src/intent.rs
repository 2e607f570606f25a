//! Discrete intents recognized by the classic rule path.

use serde::{Deserialize, Serialize};

/// An intent the deterministic phrase table can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    GetDate,
    GetTime,
    PlugOn,
    PlugOff,
    EmergencyAlert,
    ContactPerson,
    CreateDailyReminder,
    CreateReminder,
    ListReminders,
    DeleteReminder,
    ReadMessages,
    SendMessage,
    ShutdownDevice,
}

impl Intent {
    pub const ALL: [Intent; 13] = [
        Intent::GetDate,
        Intent::GetTime,
        Intent::PlugOn,
        Intent::PlugOff,
        Intent::EmergencyAlert,
        Intent::ContactPerson,
        Intent::CreateDailyReminder,
        Intent::CreateReminder,
        Intent::ListReminders,
        Intent::DeleteReminder,
        Intent::ReadMessages,
        Intent::SendMessage,
        Intent::ShutdownDevice,
    ];

    /// Canonical name, as used in configuration block lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetDate => "GET_DATE",
            Self::GetTime => "GET_TIME",
            Self::PlugOn => "PLUG_ON",
            Self::PlugOff => "PLUG_OFF",
            Self::EmergencyAlert => "EMERGENCY_ALERT",
            Self::ContactPerson => "CONTACT_PERSON",
            Self::CreateDailyReminder => "CREATE_DAILY_REMINDER",
            Self::CreateReminder => "CREATE_REMINDER",
            Self::ListReminders => "LIST_REMINDERS",
            Self::DeleteReminder => "DELETE_REMINDER",
            Self::ReadMessages => "READ_MESSAGES",
            Self::SendMessage => "SEND_MESSAGE",
            Self::ShutdownDevice => "SHUTDOWN_DEVICE",
        }
    }

    /// Command category handed to the external executor.
    pub fn command(&self) -> &'static str {
        match self {
            Self::GetDate => "fecha",
            Self::GetTime => "hora",
            Self::PlugOn | Self::PlugOff => "enchufe",
            Self::EmergencyAlert => "emergencia",
            Self::ContactPerson => "contacto_emergencia",
            Self::CreateDailyReminder
            | Self::CreateReminder
            | Self::ListReminders
            | Self::DeleteReminder => "recordatorio",
            Self::ReadMessages => "leer_mensajes",
            Self::SendMessage => "enviar_mensaje",
            Self::ShutdownDevice => "sistema_apagar",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Intent::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| format!("unknown intent '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_names_round_trip_through_from_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
        assert_eq!("get_time".parse::<Intent>().unwrap(), Intent::GetTime);
        assert!("MAKE_COFFEE".parse::<Intent>().is_err());
    }

    #[test]
    fn reminder_intents_share_a_command() {
        assert_eq!(Intent::CreateReminder.command(), "recordatorio");
        assert_eq!(Intent::DeleteReminder.command(), "recordatorio");
        assert_eq!(Intent::PlugOff.command(), "enchufe");
    }
}
