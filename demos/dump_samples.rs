// Dump stat samples as JSON points.
//
// Usage: cargo run --example dump_samples -- [DB_PATH] [SERVER_ID]
//   DB_PATH    default: ./data/directory.db
//   SERVER_ID  default: all servers combined

use craftlist::db;
use craftlist::stats_repo::StatsRepo;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("./data/directory.db");
    let server_id: Option<i64> = args.get(2).and_then(|s| s.parse().ok());

    let pool = db::connect(path, 2).await?;
    let points = StatsRepo::new(pool).raw_series(server_id, None, None).await?;

    println!("{}", serde_json::to_string_pretty(&points)?);
    Ok(())
}
