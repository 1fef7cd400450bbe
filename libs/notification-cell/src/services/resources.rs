use futures::future::join_all;

use crate::models::Resource;
use crate::services::upstream::UpstreamClient;

/// Curated reading list shown next to the notifications.
pub fn curated_resources() -> Vec<Resource> {
    [
        ("MoHFW Press Releases (English)", "https://www.mohfw.gov.in/press-release", "mohfw"),
        ("WHO Maternal Health", "https://www.who.int/topics/pregnancy/en/", "who"),
        (
            "ACOG Patient Education",
            "https://www.acog.org/clinical-information/patient-education-materials",
            "acog",
        ),
    ]
    .into_iter()
    .map(|(title, url, source)| Resource {
        title: title.to_string(),
        url: url.to_string(),
        source: source.to_string(),
        updated_at: None,
    })
    .collect()
}

/// Fills `updated_at` for every resource concurrently, newest first.
pub async fn annotate_resources(client: &UpstreamClient, resources: Vec<Resource>) -> Vec<Resource> {
    let dates = join_all(resources.iter().map(|r| client.last_modified(&r.url))).await;

    let mut annotated: Vec<Resource> = resources
        .into_iter()
        .zip(dates)
        .map(|(resource, updated_at)| Resource { updated_at, ..resource })
        .collect();

    sort_by_freshness(&mut annotated);
    annotated
}

/// Dated entries newest first, undated last; ties keep their order.
pub fn sort_by_freshness(resources: &mut [Resource]) {
    resources.sort_by(|a, b| match (a.updated_at, b.updated_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
