/// The closed set of recognized legislative stage ("version") codes, mapped
/// to a short human-readable description.
pub const BILL_TYPES: &[(&str, &str)] = &[
    ("ih", "Introduced (House)"),
    ("as", "Amendment (Senate)"),
    ("ash", "Additional Sponsors (House)"),
    ("ath", "Agreed to (House)"),
    ("ats", "Agreed to (Senate)"),
    ("cdh", "Committee Discharged (House)"),
    ("cds", "Committee Discharged (Senate)"),
    ("cph", "Considered and Passed (House)"),
    ("cps", "Considered and Passed (Senate)"),
    ("eah", "Engrossed Amendment (House)"),
    ("eas", "Engrossed Amendment (Senate)"),
    ("eh", "Engrossed (House)"),
    ("es", "Engrossed (Senate)"),
    ("enr", "Enrolled"),
    ("eph", "Engrossed and Deemed Passed by House"),
    ("fah", "Failed Amendment (House)"),
    ("fph", "Failed Passage (House)"),
    ("fps", "Failed Passage (Senate)"),
    ("hdh", "Held at Desk (House)"),
    ("hds", "Held at Desk (Senate)"),
    ("iph", "Indefinitely Postponed (House)"),
    ("ips", "Indefinitely Postponed (Senate)"),
    ("is", "Introduced (Senate)"),
    ("lth", "Laid on Table (House)"),
    ("lts", "Laid on Table (Senate)"),
    ("oph", "Ordered to be Printed (House)"),
    ("ops", "Ordered to be Printed (Senate)"),
    ("pap", "Printed as Passed"),
    ("pav", "Previous Action Vitiated"),
    ("pch", "Placed on Calendar (House)"),
    ("pcs", "Placed on Calendar (Senate)"),
    ("pp", "Public Print"),
    ("pwah", "Ordered to be Printed with House Amendment"),
    ("rah", "Referred with Amendments (House)"),
    ("ras", "Referred with Amendments (Senate)"),
    ("rch", "Reference Change (House)"),
    ("rcs", "Reference Change (Senate)"),
    ("rdh", "Received in (House)"),
    ("rds", "Received in (Senate)"),
    ("reah", "Re-engrossed Amendment (House)"),
    ("renr", "Re-enrolled Bill"),
    ("res", "Re-engrossed Amendment (Senate)"),
    ("rfh", "Referred in (House)"),
    ("rfs", "Referred in (Senate)"),
    ("rh", "Reported in (House)"),
    ("rih", "Referral Instructions (House)"),
    ("ris", "Referral Instructions (Senate)"),
    ("rs", "Reported in (Senate)"),
    ("rth", "Referred to Committee (House)"),
    ("rts", "Referred to Committee (Senate)"),
    ("sas", "Additional Sponsors (Senate)"),
    ("sc", "Sponsor Change"),
];

/// Looks up the description for a stage code, if recognized.
#[must_use]
pub fn describe_stage(code: &str) -> Option<&'static str> {
    BILL_TYPES
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, desc)| *desc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_stage_codes_resolve() {
        assert_eq!(describe_stage("ih"), Some("Introduced (House)"));
        assert_eq!(describe_stage("enr"), Some("Enrolled"));
    }

    #[test]
    fn unknown_stage_code_is_none() {
        assert_eq!(describe_stage("zz"), None);
    }
}
