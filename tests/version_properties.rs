//! Property tests for the version grammars and derivation chain

use proptest::prelude::*;

use rtkernel::kernel::sources::LinkBuilder;
use rtkernel::{
    kernel_from_patch, major_tag_from_minor, minor_from_kernel, trim_trailing_segment, FullPatch,
    VersionError,
};

proptest! {
    #[test]
    fn derivation_chain_holds(x in 2u32..10, y in 0u32..30, z in 0u32..300, n in 1u32..100) {
        let patch = format!("{}.{}.{}-rt{}", x, y, z, n);

        let kernel = kernel_from_patch(&patch).unwrap();
        prop_assert_eq!(kernel.as_str(), format!("{}.{}.{}", x, y, z));

        let minor = minor_from_kernel(kernel.as_str()).unwrap();
        prop_assert_eq!(minor.as_str(), format!("{}.{}", x, y));

        let major = major_tag_from_minor(minor.as_str()).unwrap();
        prop_assert_eq!(major.as_str(), format!("v{}.x", x));
    }

    #[test]
    fn kernel_without_rt_suffix_is_not_a_patch(x in 2u32..10, y in 0u32..30, z in 0u32..300) {
        let kernel = format!("{}.{}.{}", x, y, z);
        prop_assert!(
            matches!(kernel_from_patch(&kernel), Err(VersionError::Malformed { .. })),
            "expected malformed patch version"
        );
        prop_assert!(kernel.parse::<FullPatch>().is_err());
    }

    #[test]
    fn trim_never_grows(text in "[0-9a-z.\\-]{0,20}") {
        let trimmed = trim_trailing_segment(&text);
        prop_assert!(text.starts_with(trimmed));
        if !text.contains('.') {
            prop_assert_eq!(trimmed, text.as_str());
        }
    }

    #[test]
    fn links_are_well_formed(x in 2u32..10, y in 0u32..30, z in 0u32..300, n in 1u32..100) {
        let patch: FullPatch = format!("{}.{}.{}-rt{}", x, y, z, n).parse().unwrap();
        let links = LinkBuilder::default().build_links(&patch).unwrap();

        let kernel_suffix = format!("/v{}.x/linux-{}.{}.{}.tar.xz", x, x, y, z);
        let patch_suffix = format!("/{}.{}/older/patch-{}.patch.xz", x, y, patch);
        prop_assert!(links.kernel.as_str().ends_with(&kernel_suffix));
        prop_assert!(links.patch.as_str().ends_with(&patch_suffix));
        for link in links.iter() {
            prop_assert_eq!(link.url().scheme(), "https");
        }
    }
}

#[test]
fn test_worked_example() {
    let kernel = kernel_from_patch("5.10.78-rt55").unwrap();
    assert_eq!(kernel.as_str(), "5.10.78");
    let minor = minor_from_kernel(kernel.as_str()).unwrap();
    assert_eq!(minor.as_str(), "5.10");
    assert_eq!(major_tag_from_minor("5.11").unwrap().as_str(), "v5.x");
    assert_eq!(major_tag_from_minor(minor.as_str()).unwrap().as_str(), "v5.x");
}

#[test]
fn test_malformed_inputs() {
    assert!(minor_from_kernel("5.10").is_err());
    assert!(major_tag_from_minor("v5.10").is_err());
    assert!(major_tag_from_minor("x.10").is_err());
    assert!(kernel_from_patch("5.10.78-rt").is_err());
}

#[test]
fn test_debian_index_url_for_trixie() {
    let url = LinkBuilder::default()
        .debian_index_url("trixie", "amd64")
        .unwrap();
    assert_eq!(url.as_str(), "https://packages.debian.org/trixie/amd64/kernel/");
}
