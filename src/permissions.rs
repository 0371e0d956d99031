//! Static role → permission table.

use crate::models::Role;

const ADMIN: &[&str] = &[
    "can_create_users",
    "can_delete_users",
    "can_manage_all",
    "can_view_all_dashboards",
    "can_manage_campaigns",
    "can_manage_donations",
    "can_manage_volunteers",
];

const CAMPAIGN: &[&str] = &[
    "can_manage_campaigns",
    "can_view_campaign_reports",
    "can_create_campaigns",
    "can_edit_campaigns",
];

const DONATION: &[&str] = &[
    "can_manage_donations",
    "can_view_donation_reports",
    "can_process_donations",
    "can_generate_receipts",
];

const VOLUNTEER: &[&str] = &[
    "can_view_volunteer_dashboard",
    "can_update_profile",
    "can_view_assigned_tasks",
];

pub fn permissions_for(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => ADMIN,
        Role::Campaign => CAMPAIGN,
        Role::Donation => DONATION,
        Role::Volunteer => VOLUNTEER,
    }
}

pub fn has_permission(role: Role, permission: &str) -> bool {
    permissions_for(role).contains(&permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_manages_everything_but_volunteer_work() {
        assert!(has_permission(Role::Admin, "can_delete_users"));
        assert!(has_permission(Role::Admin, "can_manage_donations"));
        assert!(!has_permission(Role::Admin, "can_view_assigned_tasks"));
    }

    #[test]
    fn managers_share_only_their_domain() {
        assert!(has_permission(Role::Campaign, "can_edit_campaigns"));
        assert!(!has_permission(Role::Campaign, "can_manage_donations"));
        assert!(has_permission(Role::Donation, "can_generate_receipts"));
        assert!(!has_permission(Role::Donation, "can_create_users"));
    }

    #[test]
    fn unknown_permission_is_denied() {
        for role in Role::ALL {
            assert!(!has_permission(role, "can_launch_rockets"));
        }
    }
}
