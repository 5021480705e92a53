use std::fmt;

/// Platform result code for a completed activity (`Activity.RESULT_OK`).
pub const RESULT_OK: i32 = -1;
/// Platform result code for a cancelled activity (`Activity.RESULT_CANCELED`).
pub const RESULT_CANCELED: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Backup,
    Restore,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backup => f.write_str("backup"),
            Self::Restore => f.write_str("restore"),
        }
    }
}

/// What happens once the user has chosen a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowUp {
    /// Only remember the folder
    SelectOnly,
    /// Remember the folder, then run the operation against it
    SelectAndAct,
}

impl FollowUp {
    pub fn from_act(act: bool) -> Self {
        if act { Self::SelectAndAct } else { Self::SelectOnly }
    }
}

/// A system document-tree picker launch, identified on the wire by its request code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickerRequest {
    pub operation: Operation,
    pub follow_up: FollowUp,
}

impl PickerRequest {
    pub const BACKUP_SELECT: i32 = 22;
    pub const BACKUP_SELECT_AND_BACKUP: i32 = 23;
    pub const RESTORE_SELECT: i32 = 33;
    pub const RESTORE_SELECT_AND_RESTORE: i32 = 34;

    pub fn new(operation: Operation, act: bool) -> Self {
        Self {
            operation,
            follow_up: FollowUp::from_act(act),
        }
    }

    pub fn code(self) -> i32 {
        match (self.operation, self.follow_up) {
            (Operation::Backup, FollowUp::SelectOnly) => Self::BACKUP_SELECT,
            (Operation::Backup, FollowUp::SelectAndAct) => Self::BACKUP_SELECT_AND_BACKUP,
            (Operation::Restore, FollowUp::SelectOnly) => Self::RESTORE_SELECT,
            (Operation::Restore, FollowUp::SelectAndAct) => Self::RESTORE_SELECT_AND_RESTORE,
        }
    }

    /// Map a request code back; codes belonging to other screens yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        let (operation, act) = match code {
            Self::BACKUP_SELECT => (Operation::Backup, false),
            Self::BACKUP_SELECT_AND_BACKUP => (Operation::Backup, true),
            Self::RESTORE_SELECT => (Operation::Restore, false),
            Self::RESTORE_SELECT_AND_RESTORE => (Operation::Restore, true),
            _ => return None,
        };
        Some(Self::new(operation, act))
    }

    pub fn acts(self) -> bool {
        self.follow_up == FollowUp::SelectAndAct
    }
}

/// Opaque id tying a prompt (menu, permission dialog, in-app picker, remote
/// dialog) to the continuation waiting for its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entries of the "select folder" menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderChoice {
    /// Platform document-tree picker (scoped access, works on every version)
    SystemPicker,
    /// The app's own directory browser (needs storage permission)
    AppPicker,
    /// The configured default folder (needs storage permission)
    LegacyDefault,
}

impl FolderChoice {
    pub const ALL: [FolderChoice; 3] = [
        FolderChoice::SystemPicker,
        FolderChoice::AppPicker,
        FolderChoice::LegacyDefault,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Self::SystemPicker => 0,
            Self::AppPicker => 1,
            Self::LegacyDefault => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SystemPicker => "System folder picker",
            Self::AppPicker => "App folder picker",
            Self::LegacyDefault => "Default folder",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Operation::Backup, false, 22)]
    #[case(Operation::Backup, true, 23)]
    #[case(Operation::Restore, false, 33)]
    #[case(Operation::Restore, true, 34)]
    fn test_request_codes_are_stable(
        #[case] operation: Operation,
        #[case] act: bool,
        #[case] code: i32,
    ) {
        let request = PickerRequest::new(operation, act);

        assert_eq!(request.code(), code);
        assert_eq!(PickerRequest::from_code(code), Some(request));
        assert_eq!(request.acts(), act);
    }

    #[rstest]
    #[case(0)]
    #[case(21)]
    #[case(24)]
    #[case(35)]
    fn test_foreign_codes_are_ignored(#[case] code: i32) {
        assert_eq!(PickerRequest::from_code(code), None);
    }

    #[test]
    fn test_folder_choice_indices_match_menu_order() {
        for (index, choice) in FolderChoice::ALL.iter().enumerate() {
            assert_eq!(choice.index(), index);
            assert_eq!(FolderChoice::from_index(index), Some(*choice));
        }
        assert_eq!(FolderChoice::from_index(3), None);
    }
}
