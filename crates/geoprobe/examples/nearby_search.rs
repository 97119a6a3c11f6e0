//! Nearby search over a synthetic point table
//!
//! This example demonstrates:
//! - Building a geohash-keyed point table
//! - Paging through the points nearest to a location
//! - Narrowing results with an extra SQL filter
//! - Handling the fallback signal

use geoprobe::{
    LazyFrameBackend, NearbyResults, NearbySearcher, ProbeConfigBuilder, SearchRequest,
    data_processing::{SyntheticPointsConfig, create_test_points},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    geoprobe::init_logging(tracing::Level::INFO)?;

    let points = create_test_points(&SyntheticPointsConfig::sample())?;
    let config = ProbeConfigBuilder::new()
        .distance_column("distance_km")
        .build()?;
    let searcher = NearbySearcher::new(LazyFrameBackend::from_df(points)).with_config(config);

    println!("Five nearest points to Trafalgar Square:");
    let request = SearchRequest::new(51.5080, -0.1281)
        .limit(5)
        .select(["id", "name", "status"]);
    print_results(searcher.search(&request)?);

    println!("\nThe next five, active only:");
    let request = request.page(5, 10).extra_filter(" AND status = 'active'");
    print_results(searcher.search(&request)?);

    println!("\nSomewhere in the Atlantic:");
    print_results(searcher.search(&SearchRequest::new(30.0, -40.0))?);

    Ok(())
}

fn print_results(results: NearbyResults) {
    match results {
        NearbyResults::Found(page) => println!("{page}"),
        NearbyResults::Fallback(reason) => {
            println!("  No nearby candidates, use another strategy ({reason:?})");
        }
    }
}
