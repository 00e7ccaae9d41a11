//! Catalog integration tests against a local HTTP server
//!
//! The mirrors are pointed at a mockito server so the real `HttpFetcher` and the
//! extraction grammars run end to end without touching the network.

use std::sync::Arc;

use rtkernel::kernel::catalog::{HttpFetcher, VersionCatalog};
use rtkernel::kernel::sources::LinkBuilder;
use rtkernel::{AppError, ArtifactKind, CatalogError, MinorKernel, VersionIdentifier};

const RT_INDEX: &str = r#"<html><body><pre>
<a href="../">../</a>
<a href="6.6/">6.6/</a>                 12-May-2024 10:00    -
<a href="6.1/">6.1/</a>                 12-May-2024 10:00    -
<a href="5.10/">5.10/</a>                12-May-2024 10:00    -
<a href="6.6/">6.6/</a>                 12-May-2024 10:00    -
</pre></body></html>"#;

const OLDER_5_10: &str = r#"<html><body><pre>
<a href="patch-5.10.78-rt55.patch.xz">patch-5.10.78-rt55.patch.xz</a>
<a href="patch-5.10.78-rt55.patch.sign">patch-5.10.78-rt55.patch.sign</a>
<a href="patch-5.10.77-rt54.patch.xz">patch-5.10.77-rt54.patch.xz</a>
<a href="patch-5.10-rc4-rt1.patch.xz">patch-5.10-rc4-rt1.patch.xz</a>
<a href="patch-5.11.4-rt11.patch.xz">patch-5.11.4-rt11.patch.xz</a>
</pre></body></html>"#;

const DEBIAN_INDEX: &str = r#"<dl>
<dt><a href="linux-image-6.1.0-13-rt-amd64">linux-image-6.1.0-13-rt-amd64</a></dt>
<dt><a href="linux-image-6.1.0-13-rt-amd64-dbg">linux-image-6.1.0-13-rt-amd64-dbg</a></dt>
<dt><a href="linux-image-6.1.0-13-amd64">linux-image-6.1.0-13-amd64</a></dt>
<dt><a href="linux-image-rt-amd64">linux-image-rt-amd64</a></dt>
<dt><a href="linux-image-6.12.48+deb13-rt-amd64">linux-image-6.12.48+deb13-rt-amd64</a></dt>
</dl>"#;

const DEBIAN_DOWNLOAD: &str = r#"<ul>
<li><a href="http://ftp.us.debian.org/debian/pool/main/l/linux-signed-amd64/linux-image-6.1.0-13-rt-amd64_6.1.55-1_amd64.deb">ftp.us.debian.org/debian</a></li>
<li><a href="http://ftp.de.debian.org/debian/pool/main/l/linux-signed-amd64/linux-image-6.1.0-13-rt-amd64_6.1.55-1_amd64.deb">ftp.de.debian.org/debian</a></li>
</ul>"#;

fn catalog_for(server: &mockito::Server) -> VersionCatalog {
    let base = server.url();
    let links = LinkBuilder::new(
        &format!("{}/kernel", base),
        &format!("{}/rt", base),
        &format!("{}/debian", base),
    );
    VersionCatalog::new(Arc::new(HttpFetcher::default()), links)
}

#[tokio::test]
async fn test_minor_lines_preserve_listing_order_without_duplicates() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rt/")
        .with_status(200)
        .with_body(RT_INDEX)
        .create_async()
        .await;

    let minors = catalog_for(&server).list_minor_patch_versions().await.unwrap();
    let listed: Vec<&str> = minors.iter().map(MinorKernel::as_str).collect();
    assert_eq!(listed, vec!["6.6", "6.1", "5.10"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_patch_versions_for_one_line() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rt/5.10/older/")
        .with_status(200)
        .with_body(OLDER_5_10)
        .create_async()
        .await;

    let minor: MinorKernel = "5.10".parse().unwrap();
    let patches = catalog_for(&server)
        .list_full_patch_versions(&minor)
        .await
        .unwrap();
    let listed: Vec<String> = patches.iter().map(ToString::to_string).collect();
    assert_eq!(listed, vec!["5.10.78-rt55", "5.10.77-rt54"]);
}

#[tokio::test]
async fn test_server_error_is_source_unavailable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rt/")
        .with_status(503)
        .create_async()
        .await;

    let err = catalog_for(&server)
        .list_minor_patch_versions()
        .await
        .unwrap_err();
    match err {
        AppError::Catalog(CatalogError::SourceUnavailable { url, reason }) => {
            assert!(url.ends_with("/rt/"));
            assert!(reason.contains("503"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_listing_is_no_candidates() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rt/")
        .with_status(200)
        .with_body("<html><body>Nothing here</body></html>")
        .create_async()
        .await;

    let err = catalog_for(&server)
        .list_minor_patch_versions()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Catalog(CatalogError::NoCandidates { .. })
    ));
}

#[tokio::test]
async fn test_debian_packages_and_download_link() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/debian/trixie/amd64/kernel/")
        .with_status(200)
        .with_body(DEBIAN_INDEX)
        .create_async()
        .await;
    server
        .mock(
            "GET",
            "/debian/trixie/amd64/linux-image-6.1.0-13-rt-amd64/download",
        )
        .with_status(200)
        .with_body(DEBIAN_DOWNLOAD)
        .create_async()
        .await;

    let catalog = catalog_for(&server);
    let packages = catalog
        .list_debian_rt_packages("trixie", "amd64")
        .await
        .unwrap();
    assert_eq!(
        packages.as_slice(),
        [
            "linux-image-6.1.0-13-rt-amd64".to_string(),
            "linux-image-6.12.48+deb13-rt-amd64".to_string()
        ]
    );

    let link = catalog
        .resolve_debian_package("trixie", "amd64", &packages.as_slice()[0])
        .await
        .unwrap();
    assert_eq!(link.kind(), ArtifactKind::DebianPackage);
    assert!(link.as_str().starts_with("http://ftp.us.debian.org/"));
    assert_eq!(
        link.derived_from(),
        [VersionIdentifier::from("6.1.0".parse::<rtkernel::FullKernel>().unwrap())]
    );

    let filename = rtkernel::kernel::sources::extract_filename(link.as_str()).unwrap();
    assert!(regex::Regex::new(r"^linux-image-.+\.deb$")
        .unwrap()
        .is_match(&filename));
}

#[tokio::test]
async fn test_download_page_without_deb_is_no_candidates() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/debian/trixie/amd64/linux-image-rt-amd64/download")
        .with_status(200)
        .with_body("<p>No mirrors</p>")
        .create_async()
        .await;

    let err = catalog_for(&server)
        .resolve_debian_package("trixie", "amd64", "linux-image-rt-amd64")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Catalog(CatalogError::NoCandidates { .. })
    ));
}

#[tokio::test]
async fn test_release_tagged_package_resolves() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            "/debian/trixie/amd64/linux-image-6.12.48+deb13-rt-amd64/download",
        )
        .with_status(200)
        .with_body(
            r#"<a href="http://deb.debian.org/debian/pool/main/l/linux-signed-amd64/linux-image-6.12.48+deb13-rt-amd64_6.12.48-1_amd64.deb">deb.debian.org</a>"#,
        )
        .create_async()
        .await;

    let link = catalog_for(&server)
        .resolve_debian_package("trixie", "amd64", "linux-image-6.12.48+deb13-rt-amd64")
        .await
        .unwrap();
    assert!(link.as_str().ends_with("_amd64.deb"));
    assert_eq!(
        link.derived_from(),
        [VersionIdentifier::from("6.12.48".parse::<rtkernel::FullKernel>().unwrap())]
    );
}
