//! Platform logo lookup.

/// Known platforms and their bundled logo files.
const PLATFORM_LOGOS: &[(&str, &str)] = &[
    ("codechef.com", "codechef.png"),
    ("codeforces.com", "codeforces.svg"),
    ("atcoder.jp", "atcoder.png"),
    ("geeksforgeeks.org", "GeeksforGeeks.svg"),
    ("naukri.com/code360", "naukri.jpg"),
    ("leetcode.com", "leetcode.png"),
    ("topcoder.com", "topcoder.png"),
];

/// Asset path for a platform's logo, or `None` for unknown platforms.
pub fn logo_src(resource: &str) -> Option<String> {
    PLATFORM_LOGOS
        .iter()
        .find(|(id, _)| *id == resource)
        .map(|(_, file)| format!("/logos/{}", file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_src_known_platform() {
        assert_eq!(
            logo_src("codeforces.com").as_deref(),
            Some("/logos/codeforces.svg")
        );
    }

    #[test]
    fn test_logo_src_unknown_platform() {
        assert_eq!(logo_src("example.org"), None);
    }
}
