use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::Server;

const FILMS_BODY: &str = r#"{
    "count": 2,
    "next": null,
    "previous": null,
    "results": [
        {
            "title": "A New Hope",
            "episode_id": 4,
            "opening_crawl": "It is a period of civil war.\r\nRebel spaceships, striking\r\nfrom a hidden base, have won\r\ntheir first victory against\r\nthe evil Galactic Empire.",
            "release_date": "1977-05-25"
        },
        {
            "title": "The Empire Strikes Back",
            "episode_id": 5,
            "opening_crawl": "It is a dark time for the\r\nRebellion.",
            "release_date": "1980-05-17"
        }
    ]
}"#;

fn filmreel() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("filmreel"));
    cmd.env_remove("FILMREEL_API_URL")
        .env_remove("FILMREEL_RETRY_INTERVAL")
        .env_remove("FILMREEL_MAX_ATTEMPTS");
    cmd
}

#[test]
fn test_fetch_prints_movie_cards() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("GET", "/api/films/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(FILMS_BODY)
        .expect(1)
        .create();

    filmreel()
        .arg("fetch")
        .arg("--api-url")
        .arg(format!("{}/api/films/", url))
        .assert()
        .success()
        .stdout(predicates::str::contains("Star Wars Movies"))
        .stdout(predicates::str::contains("A New Hope"))
        .stdout(predicates::str::contains("Release Date: May 25, 1977"))
        .stdout(predicates::str::contains("The Empire Strikes Back"))
        .stdout(predicates::str::contains("It is a dark time for the Rebellion...."));

    mock.assert();
}

#[test]
fn test_fetch_json_output() {
    let mut server = Server::new();
    let url = server.url();

    let _mock = server
        .mock("GET", "/api/films/")
        .with_status(200)
        .with_body(FILMS_BODY)
        .create();

    let output = filmreel()
        .args(["fetch", "--json"])
        .env("FILMREEL_API_URL", format!("{}/api/films/", url))
        .output()
        .unwrap();

    assert!(output.status.success());
    let movies: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let movies = movies.as_array().unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0]["id"], 4);
    assert_eq!(movies[0]["title"], "A New Hope");
    assert_eq!(movies[0]["release_date"], "1977-05-25");
    assert_eq!(movies[1]["id"], 5);
    assert_eq!(
        movies[1]["opening_text"],
        "It is a dark time for the\r\nRebellion."
    );
}

#[test]
fn test_fetch_gives_up_after_max_attempts() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("GET", "/api/films/")
        .with_status(500)
        .expect(2)
        .create();

    filmreel()
        .arg("--api-url")
        .arg(format!("{}/api/films/", url))
        .args(["fetch", "--retry-interval", "1", "--max-attempts", "2"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Something went wrong... Retrying"))
        .stderr(predicates::str::contains("Giving up after 2 failed attempts."));

    mock.assert();
}

#[test]
fn test_fetch_recovers_after_retry() {
    let mut server = Server::new();
    let url = server.url();

    let failing = server
        .mock("GET", "/api/films/")
        .with_status(503)
        .expect(1)
        .create();
    let succeeding = server
        .mock("GET", "/api/films/")
        .with_status(200)
        .with_body(FILMS_BODY)
        .expect(1)
        .create();

    filmreel()
        .arg("--api-url")
        .arg(format!("{}/api/films/", url))
        .args(["fetch", "--retry-interval", "1", "--max-attempts", "5"])
        .assert()
        .success()
        .stderr(predicates::str::contains("Something went wrong... Retrying"))
        .stdout(predicates::str::contains("A New Hope"));

    failing.assert();
    succeeding.assert();
}

#[test]
fn test_fetch_malformed_body_fails() {
    let mut server = Server::new();
    let url = server.url();

    let _mock = server
        .mock("GET", "/api/films/")
        .with_status(200)
        .with_body(r#"{"results": [{"title": "A New Hope"}]}"#)
        .create();

    filmreel()
        .arg("--api-url")
        .arg(format!("{}/api/films/", url))
        .args(["fetch", "--max-attempts", "1"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Giving up after 1 failed attempts."));
}

#[test]
fn test_invalid_api_url_fails() {
    filmreel()
        .args(["fetch", "--api-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Invalid API URL"));
}

#[test]
fn test_no_subcommand_fails() {
    filmreel().assert().failure();
}
