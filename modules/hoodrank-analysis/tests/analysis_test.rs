use hoodrank_analysis::{aggregate, NeighborhoodStat, RankMetric};
use hoodrank_common::{read_json, write_json, RawScore, Record};
use hoodrank_scout::{ExtractionInput, ExtractionPipeline, Strategy};

const RANKINGS_PAGE: &str = r#"<script>
const rankings = {"ny": {
  "hot":    {"1": [{"name": "A", "hood": "SoHo", "attractive_score": "8.0", "age_score": "7.0", "gender_score": "5.0"}]},
  "age":    {"1": [{"name": "a", "hood": "Tribeca", "attractive_score": "1.0", "age_score": "1.0", "gender_score": "1.0"}]},
  "gender": {"1": [{"name": "B", "hood": "SoHo", "attractive_score": "6.0", "age_score": "5.0", "gender_score": "3.0"}]}
}};
</script>"#;

fn rec(name: &str, hood: Option<&str>, attractive: RawScore) -> Record {
    let mut r = Record::new(name).unwrap();
    r.hood = hood.map(String::from);
    r.attractive_score = Some(attractive);
    r
}

#[tokio::test]
async fn rankings_page_to_neighborhood_table() {
    let extraction = ExtractionPipeline::default()
        .run(ExtractionInput::html(RANKINGS_PAGE))
        .await;
    assert_eq!(extraction.strategy, Strategy::EmbeddedObject);

    let table = aggregate(&extraction.records);

    assert_eq!(table.len(), 1);
    assert_eq!(
        table.stats()[0],
        NeighborhoodStat {
            neighborhood: "SoHo".into(),
            restaurant_count: 2,
            avg_attractive: 7.0,
            avg_age: 6.0,
            avg_gender: 4.0,
            median_attractive: 7.0,
            std_attractive: 1.41,
        }
    );
}

#[tokio::test]
async fn fallback_dataset_aggregates_to_three_neighborhoods() {
    let extraction = ExtractionPipeline::default()
        .run(ExtractionInput::html("<html></html>"))
        .await;
    let table = aggregate(&extraction.records);

    assert_eq!(table.len(), 3);
    let hottest: Vec<_> = table.hottest().iter().map(|s| s.neighborhood.clone()).collect();
    assert_eq!(hottest, vec!["Upper East Side", "West Village", "SoHo"]);
    let female: Vec<_> = table.most_female().iter().map(|s| s.neighborhood.clone()).collect();
    assert_eq!(female, vec!["Upper East Side", "SoHo", "West Village"]);
}

#[test]
fn only_allow_listed_neighborhoods_survive() {
    let table = aggregate(&[
        rec("x", Some("Brooklyn Heights"), RawScore::Number(9.0)),
        rec("y", None, RawScore::Number(9.0)),
        rec("z", Some("Nolita"), RawScore::Number(4.0)),
    ]);
    let hoods: Vec<_> = table.stats().iter().map(|s| s.neighborhood.as_str()).collect();
    assert_eq!(hoods, vec!["Nolita"]);
}

#[test]
fn mixed_and_invalid_scores_coerce() {
    let table = aggregate(&[
        rec("x", Some("Chinatown"), RawScore::from("not-a-number")),
        rec("y", Some("Chinatown"), RawScore::from("8")),
    ]);
    assert_eq!(table.stats()[0].avg_attractive, 4.0);
}

#[test]
fn table_round_trips_through_json() {
    let table = aggregate(&[
        rec("x", Some("Koreatown"), RawScore::Number(7.5)),
        rec("y", Some("NoMad"), RawScore::Number(8.25)),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("neighborhood_analysis.json");
    write_json(&path, table.stats()).unwrap();
    let back: Vec<NeighborhoodStat> = read_json(&path).unwrap();

    assert_eq!(back, table.stats());
    assert_eq!(table.top(RankMetric::AvgAttractive, 1)[0].neighborhood, "NoMad");
}
