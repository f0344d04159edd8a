use once_cell::sync::Lazy;
use regex::Regex;

/// Role an agent window plays in a team session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    ProjectManager,
    QaEngineer,
    Developer,
}

impl Role {
    /// Status line echoed into the window for a status request
    pub fn status_line(self, timestamp: &str) -> String {
        match self {
            Role::ProjectManager => format!(
                "[{}] PROJECT STATUS: Coordinating team activities. Monitoring QA and development progress. Ready to assist with project management tasks.",
                timestamp
            ),
            Role::QaEngineer => format!(
                "[{}] QA STATUS: Systems operational. Ready to run tests and validate code quality. Awaiting code submissions for testing.",
                timestamp
            ),
            Role::Developer => format!(
                "[{}] DEVELOPER STATUS: Ready for development tasks. Environment configured. Awaiting project requirements or code assignments.",
                timestamp
            ),
        }
    }
}

/// Maps a window to a role
pub trait RolePolicy: Send + Sync {
    fn role(&self, window_name: &str, window_index: u32) -> Role;
}

static RE_MANAGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)project|manager").unwrap());

static RE_QA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)qa|test").unwrap());

static RE_DEV: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)dev|code").unwrap());

/// Guesses the role from keywords in the window name, falling back to the
/// conventional team layout (0 = manager, 1 = QA, 2 = developer).
pub struct NameHeuristics;

impl RolePolicy for NameHeuristics {
    fn role(&self, window_name: &str, window_index: u32) -> Role {
        // Priority order: manager > QA > developer
        if RE_MANAGER.is_match(window_name) || window_index == 0 {
            return Role::ProjectManager;
        }

        if RE_QA.is_match(window_name) || window_index == 1 {
            return Role::QaEngineer;
        }

        if RE_DEV.is_match(window_name) || window_index == 2 {
            return Role::Developer;
        }

        Role::Developer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_name() {
        assert_eq!(NameHeuristics.role("Project-Lead", 5), Role::ProjectManager);
        assert_eq!(NameHeuristics.role("QA", 5), Role::QaEngineer);
        assert_eq!(NameHeuristics.role("unit-tests", 7), Role::QaEngineer);
        assert_eq!(NameHeuristics.role("backend-dev", 4), Role::Developer);
    }

    #[test]
    fn test_detect_by_index() {
        assert_eq!(NameHeuristics.role("shell", 0), Role::ProjectManager);
        assert_eq!(NameHeuristics.role("shell", 1), Role::QaEngineer);
        assert_eq!(NameHeuristics.role("shell", 2), Role::Developer);
    }

    #[test]
    fn test_index_zero_wins_over_name() {
        assert_eq!(NameHeuristics.role("qa", 0), Role::ProjectManager);
    }

    #[test]
    fn test_unknown_defaults_to_developer() {
        assert_eq!(NameHeuristics.role("scratch", 9), Role::Developer);
    }

    #[test]
    fn test_status_line_carries_timestamp() {
        let line = Role::QaEngineer.status_line("12:00:00");
        assert!(line.starts_with("[12:00:00] QA STATUS:"));
    }
}
