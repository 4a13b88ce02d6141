//! The static charity catalog.

use serde::Serialize;
use std::fmt;

/// A charity that can receive donations.
///
/// Entries are compiled in and never change at runtime. The `trustworthy` flag is the only
/// input to the trust gate in [`DonationWorkflow::donate`](crate::DonationWorkflow::donate).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Charity {
    pub id: u64,
    pub name: &'static str,
    pub description: &'static str,
    pub trustworthy: bool,
}

impl Charity {
    const fn new(
        id: u64,
        name: &'static str,
        description: &'static str,
        trustworthy: bool,
    ) -> Self {
        Self { id, name, description, trustworthy }
    }

    /// Label shown next to the name in listings.
    pub const fn trust_label(&self) -> &'static str {
        if self.trustworthy { "Trustworthy" } else { "Not Trustworthy" }
    }
}

impl fmt::Display for Charity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.trust_label())
    }
}

/// All known charities, ordered by id.
pub static CHARITIES: &[Charity] = &[
    Charity::new(
        1,
        "Hope for Education",
        "Education support for underprivileged children.",
        true,
    ),
    Charity::new(2, "Food for All", "Food distribution in low-income communities.", true),
    Charity::new(3, "Animal Welfare Org", "Animal protection and welfare services.", false),
    Charity::new(4, "Fake Fundraisers", "Unverified charity", false),
    Charity::new(
        5,
        "Clean Water Initiative",
        "Providing clean and safe drinking water in remote areas.",
        true,
    ),
    Charity::new(
        6,
        "Green Earth Project",
        "Environmental conservation and reforestation efforts.",
        true,
    ),
    Charity::new(
        7,
        "Health and Hope",
        "Medical aid for communities lacking healthcare facilities.",
        true,
    ),
    Charity::new(8, "Children’s Relief Fund", "Aid for children affected by conflict.", false),
    Charity::new(
        9,
        "Global Refugee Support",
        "Support for displaced families and individuals.",
        true,
    ),
    Charity::new(10, "Ocean Clean-Up Crew", "Removing plastic and waste from oceans.", true),
    Charity::new(11, "Housing for All", "Affordable housing for homeless individuals.", true),
    Charity::new(12, "Education Without Borders", "Promoting education access worldwide.", true),
    Charity::new(13, "Youth Empowerment Org", "Providing job training for youth.", false),
    Charity::new(14, "Tech for All", "Technology access for remote regions.", true),
    Charity::new(15, "Wildlife Rescue Foundation", "Protecting endangered wildlife.", true),
    Charity::new(16, "Disaster Relief Squad", "Immediate assistance in natural disasters.", true),
    Charity::new(17, "Senior Citizen Support", "Aid for elderly people in need.", false),
    Charity::new(
        18,
        "Women’s Rights Advocacy",
        "Empowering women through support and education.",
        true,
    ),
    Charity::new(19, "Peacekeepers International", "Promoting peace in conflict zones.", false),
    Charity::new(
        20,
        "Local Community Builders",
        "Building infrastructure in local communities.",
        true,
    ),
];

/// Looks up a charity by id.
pub fn find(id: u64) -> Option<&'static Charity> {
    CHARITIES.iter().find(|charity| charity.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_ordered() {
        let ids: Vec<_> = CHARITIES.iter().map(|c| c.id).collect();
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn can_find_by_id() {
        let hope = find(1).unwrap();
        assert_eq!(hope.name, "Hope for Education");
        assert!(hope.trustworthy);

        let animals = find(3).unwrap();
        assert!(!animals.trustworthy);
        assert_eq!(animals.to_string(), "Animal Welfare Org (Not Trustworthy)");

        assert!(find(0).is_none());
        assert!(find(21).is_none());
    }
}
