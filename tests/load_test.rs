//! Concurrency test over a real socket.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use todo_service::lifecycle::Shutdown;
use todo_service::todos::Todo;
use todo_service::HttpServer;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates() {
    let config = common::test_config();
    let connector = common::FlakyConnector::new();
    let service = common::start(&config, &connector).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(service.state.clone(), &config);
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for worker in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{}/todos", addr);
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for n in 0..requests_per_task {
                let req_start = Instant::now();
                let res = client
                    .post(&url)
                    .json(&serde_json::json!({ "task": format!("task {worker}-{n}") }))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(res.status(), 201);
                latencies.push(req_start.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }
    let duration = start.elapsed();

    let todos: Vec<Todo> = client
        .get(format!("http://{}/todos", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(todos.len(), total_requests);
    let ids: HashSet<i64> = todos.iter().map(|t| t.id).collect();
    assert_eq!(ids, (1..=total_requests as i64).collect());

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];
    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Requests/sec:   {:.2}", total_requests as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    drop(client);
    assert!(shutdown.trigger());
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
