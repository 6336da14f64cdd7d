//! Admin "Users" page: a non-persistent demo fixture with search, filters,
//! sorting and row actions. Nothing here is sent to the account service.

use std::fmt;

use crate::toast::Toast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Active,
    Inactive,
    Suspended,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
            Status::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: Status,
    pub last_active: String,
    pub joined_date: String,
}

impl AdminUser {
    fn new(
        id: &str,
        name: &str,
        email: &str,
        role: Role,
        status: Status,
        last_active: &str,
        joined_date: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            status,
            last_active: last_active.to_string(),
            joined_date: joined_date.to_string(),
        }
    }

    /// Column value as displayed; sorting compares these strings.
    pub fn field(&self, field: SortField) -> &str {
        match field {
            SortField::Id => &self.id,
            SortField::Name => &self.name,
            SortField::Email => &self.email,
            SortField::Role => self.role.as_str(),
            SortField::Status => self.status.as_str(),
            SortField::LastActive => &self.last_active,
            SortField::JoinedDate => &self.joined_date,
        }
    }
}

/// The ten demo rows shown on a fresh page load.
pub fn fixture() -> Vec<AdminUser> {
    use Role::*;
    use Status::*;

    vec![
        AdminUser::new("1", "Jane Doe", "jane@example.com", Admin, Active, "2 hours ago", "Mar 15, 2023"),
        AdminUser::new("2", "John Smith", "john@example.com", User, Active, "1 day ago", "Apr 20, 2023"),
        AdminUser::new("3", "Emily Johnson", "emily@example.com", User, Inactive, "2 weeks ago", "Jan 10, 2023"),
        AdminUser::new("4", "Michael Brown", "michael@example.com", Moderator, Active, "3 days ago", "Feb 28, 2023"),
        AdminUser::new("5", "Sarah Wilson", "sarah@example.com", User, Suspended, "1 month ago", "Dec 5, 2022"),
        AdminUser::new("6", "David Lee", "david@example.com", User, Active, "5 hours ago", "May 12, 2023"),
        AdminUser::new("7", "Lisa Taylor", "lisa@example.com", User, Active, "1 week ago", "Jun 8, 2023"),
        AdminUser::new("8", "Robert Martinez", "robert@example.com", Moderator, Active, "12 hours ago", "Jul 22, 2023"),
        AdminUser::new("9", "Jennifer Garcia", "jennifer@example.com", User, Inactive, "3 weeks ago", "Aug 30, 2023"),
        AdminUser::new("10", "Thomas Anderson", "thomas@example.com", User, Active, "4 days ago", "Sep 15, 2023"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    Email,
    Role,
    Status,
    LastActive,
    JoinedDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserTable {
    users: Vec<AdminUser>,
    search: String,
    status_filter: Option<Status>,
    role_filter: Option<Role>,
    sort_field: SortField,
    sort_direction: SortDirection,
}

impl Default for UserTable {
    fn default() -> Self {
        Self::new(fixture())
    }
}

impl UserTable {
    /// Table sorted by name ascending with no filters.
    pub fn new(users: Vec<AdminUser>) -> Self {
        Self {
            users,
            search: String::new(),
            status_filter: None,
            role_filter: None,
            sort_field: SortField::Name,
            sort_direction: SortDirection::Asc,
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_status_filter(&mut self, status: Option<Status>) {
        self.status_filter = status;
    }

    pub fn set_role_filter(&mut self, role: Option<Role>) {
        self.role_filter = role;
    }

    pub fn sort(&self) -> (SortField, SortDirection) {
        (self.sort_field, self.sort_direction)
    }

    /// Re-selecting the current field flips the direction; a new field
    /// starts ascending.
    pub fn sort_by(&mut self, field: SortField) {
        if field == self.sort_field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Asc;
        }
    }

    fn matches(&self, user: &AdminUser) -> bool {
        let search = self.search.to_lowercase();
        let matches_search = user.name.to_lowercase().contains(&search)
            || user.email.to_lowercase().contains(&search);
        let matches_status = self.status_filter.map_or(true, |status| user.status == status);
        let matches_role = self.role_filter.map_or(true, |role| user.role == role);

        matches_search && matches_status && matches_role
    }

    /// Rows on screen: filtered, then stably sorted.
    pub fn visible(&self) -> Vec<&AdminUser> {
        let mut rows: Vec<&AdminUser> = self.users.iter().filter(|u| self.matches(u)).collect();
        rows.sort_by(|a, b| {
            let ordering = a.field(self.sort_field).cmp(b.field(self.sort_field));
            match self.sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        rows
    }

    pub fn get(&self, id: &str) -> Option<&AdminUser> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn delete(&mut self, id: &str) -> Option<Toast> {
        let position = self.users.iter().position(|user| user.id == id)?;
        let removed = self.users.remove(position);
        Some(Toast::success(
            "User deleted",
            format!("{} has been removed from the system.", removed.name),
        ))
    }

    pub fn change_status(&mut self, id: &str, status: Status) -> Option<Toast> {
        let user = self.users.iter_mut().find(|user| user.id == id)?;
        user.status = status;
        Some(Toast::success(
            "Status updated",
            format!("User status has been changed to {status}."),
        ))
    }

    pub fn change_role(&mut self, id: &str, role: Role) -> Option<Toast> {
        let user = self.users.iter_mut().find(|user| user.id == id)?;
        user.role = role;
        Some(Toast::success(
            "Role updated",
            format!("User role has been changed to {role}."),
        ))
    }

    /// `Total users: n`, plus `(filtered from m)` while a filter hides rows.
    pub fn caption(&self) -> String {
        let shown = self.visible().len();
        if shown == self.users.len() {
            format!("Total users: {shown}")
        } else {
            format!("Total users: {shown} (filtered from {})", self.users.len())
        }
    }

    /// CSV of the rows currently on screen.
    pub fn export_csv(&self) -> (String, Toast) {
        let mut csv = String::from("Name,Email,Role,Status,Last Active,Joined Date\n");
        let lines: Vec<String> = self
            .visible()
            .into_iter()
            .map(|user| {
                [
                    user.name.as_str(),
                    user.email.as_str(),
                    user.role.as_str(),
                    user.status.as_str(),
                    user.last_active.as_str(),
                    user.joined_date.as_str(),
                ]
                .map(csv_field)
                .join(",")
            })
            .collect();
        csv.push_str(&lines.join("\n"));

        (
            csv,
            Toast::success("Export complete", "User data has been exported as CSV."),
        )
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
