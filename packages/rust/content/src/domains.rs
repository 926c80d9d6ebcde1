//! Built-in domain table, used when the content has no `domains.yaml`.

use std::sync::LazyLock;

use coursehub_shared::DomainInfo;

fn domain(
    id: &str,
    label: &str,
    description: &str,
    tools: &[&str],
    methodologies: &[&str],
    keywords: &[&str],
) -> DomainInfo {
    let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
    DomainInfo {
        id: id.into(),
        label: label.into(),
        description: description.into(),
        tools: owned(tools),
        methodologies: owned(methodologies),
        keywords: owned(keywords),
    }
}

static BUILTIN: LazyLock<Vec<DomainInfo>> = LazyLock::new(|| {
    vec![
        domain(
            "urban",
            "Urban Studies",
            "Urban form, land use and city systems.",
            &["QGIS", "ArcGIS", "UrbanSim"],
            &["spatial analysis", "agent-based modelling"],
            &["urban", "city", "cities", "land use", "城市", "规划", "planning"],
        ),
        domain(
            "transportation",
            "Transportation",
            "Mobility, traffic and transit networks.",
            &["SUMO", "MATSim", "VISSIM"],
            &["traffic simulation", "network analysis"],
            &["transport", "traffic", "transit", "mobility", "交通", "出行"],
        ),
        domain(
            "environmental",
            "Environmental Science",
            "Climate, ecology and pollution.",
            &["R", "Google Earth Engine"],
            &["remote sensing", "life-cycle assessment"],
            &["environment", "climate", "ecology", "pollution", "环境", "生态", "气候"],
        ),
        domain(
            "economic",
            "Economics",
            "Markets, policy evaluation and regional economics.",
            &["Stata", "Python"],
            &["econometrics", "input-output analysis"],
            &["economic", "economy", "econometric", "market", "经济"],
        ),
        domain(
            "social",
            "Social Science",
            "Populations, communities and social networks.",
            &["NetLogo", "Gephi"],
            &["survey design", "social network analysis"],
            &["social", "society", "population", "demograph", "社会", "人口"],
        ),
        domain(
            "public-health",
            "Public Health",
            "Epidemiology and health systems.",
            &["R", "EpiModel"],
            &["epidemiological modelling"],
            &["health", "epidemic", "epidemiology", "disease", "健康", "疾病"],
        ),
    ]
});

/// The compiled-in domain table. Built once per process.
pub fn builtin_domains() -> &'static [DomainInfo] {
    &BUILTIN
}
