use anyhow::Error;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    AskQuestions,
    PostAnswers,
    MarkSolutions,
    ManageTrustedReviewers,
    SendFeedback,
    RequestReviewerRole,

    WriteReviews,
    ReviseOwnReviews,

    ApproveReviewerRequests,
    ManageProbation,

    ManageUsers,
}

/// A user holds one or more roles; a permission is granted when any of
/// their roles carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Reviewer,
    Instructor,
    Staff,
    Admin,
}

static STUDENT_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::AskQuestions);
    permissions.insert(Permission::PostAnswers);
    permissions.insert(Permission::MarkSolutions);
    permissions.insert(Permission::ManageTrustedReviewers);
    permissions.insert(Permission::SendFeedback);
    permissions.insert(Permission::RequestReviewerRole);

    permissions
});

static REVIEWER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::WriteReviews);
    permissions.insert(Permission::ReviseOwnReviews);

    permissions
});

static INSTRUCTOR_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ApproveReviewerRequests);
    permissions.insert(Permission::ManageProbation);

    permissions
});

static STAFF_PERMISSIONS: Lazy<HashSet<Permission>> =
    Lazy::new(|| INSTRUCTOR_PERMISSIONS.iter().copied().collect());

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(INSTRUCTOR_PERMISSIONS.iter().copied());
    permissions.insert(Permission::ManageUsers);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Student => &STUDENT_PERMISSIONS,
            Role::Reviewer => &REVIEWER_PERMISSIONS,
            Role::Instructor => &INSTRUCTOR_PERMISSIONS,
            Role::Staff => &STAFF_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => "student",
            Role::Reviewer => "reviewer",
            Role::Instructor => "instructor",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "student" => Ok(Role::Student),
            "reviewer" => Ok(Role::Reviewer),
            "instructor" => Ok(Role::Instructor),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
