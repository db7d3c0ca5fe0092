//! Fronius Solar API v1 archive client.

mod response;

use std::time::Duration;

use chrono::{Days, NaiveDate};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use self::response::{ArchiveResponse, Envelope};
use crate::{aggregate::EnergyReading, date_range::DateRange, prelude::*, quantity::WattHours};

const ARCHIVE_PATH: &str = "solar_api/v1/GetArchiveData.cgi";

const SECONDS_PER_DAY: u64 = 86_400;

pub struct Client {
    inner: reqwest::Client,
    url: Url,
}

impl Client {
    /// Create a client for the inverter at `address`.
    ///
    /// The address is a host name or IP address with an optional port, or a full base URL.
    #[instrument(skip_all, fields(address = address))]
    pub fn new(address: &str, timeout: Duration) -> Result<Self> {
        let base_url = if address.contains("://") {
            address.to_owned()
        } else {
            format!("http://{address}")
        };
        let url = Url::parse(&base_url)
            .with_context(|| format!("invalid inverter address `{address}`"))?
            .join(ARCHIVE_PATH)?;
        let inner = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { inner, url })
    }

    /// Fetch the daily produced energy for every day of the range.
    #[instrument(skip_all, fields(range = %range))]
    pub async fn get_daily_production(
        &self,
        range: DateRange,
    ) -> Result<Vec<EnergyReading>, FetchError> {
        let request = self
            .inner
            .get(self.url.clone())
            .query(&ArchiveQuery::daily_production(range))
            .build()
            .map_err(|source| FetchError::Request { url: self.url.clone(), source })?;
        let url = request.url().clone();
        info!(%url, "fetching…");

        let body = async { self.inner.execute(request).await?.error_for_status()?.text().await }
            .await
            .map_err(|source| FetchError::Request { url, source })?;
        let readings = parse_daily_production(range, &body)?;
        info!(n_readings = readings.len(), "fetched");
        Ok(readings)
    }
}

#[derive(Serialize)]
struct ArchiveQuery {
    #[serde(rename = "Scope")]
    scope: &'static str,

    #[serde(rename = "Channel")]
    channel: &'static str,

    #[serde(rename = "SeriesType")]
    series_type: &'static str,

    #[serde(rename = "StartDate")]
    start_date: NaiveDate,

    #[serde(rename = "EndDate")]
    end_date: NaiveDate,
}

impl ArchiveQuery {
    const fn daily_production(range: DateRange) -> Self {
        Self {
            scope: "System",
            channel: "EnergyReal_WAC_Sum_Produced",
            series_type: "DailySum",
            start_date: range.start,
            end_date: range.end,
        }
    }
}

/// Single archive request failure.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to call `{url}`")]
    Request {
        url: Url,

        #[source]
        source: reqwest::Error,
    },

    #[error("the response is not valid JSON")]
    MalformedJson {
        body: String,

        #[source]
        source: serde_json::Error,
    },

    #[error(r#"the inverter responded with status {code} ("{reason}")"#)]
    Api { code: i64, reason: String, payload: serde_json::Value },

    #[error("unexpected response structure")]
    UnexpectedShape {
        payload: serde_json::Value,

        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Response payload for diagnostics: pretty-printed when it was valid JSON, raw otherwise.
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        match self {
            Self::Request { .. } => None,
            Self::MalformedJson { body, .. } => Some(body.clone()),
            Self::Api { payload, .. } | Self::UnexpectedShape { payload, .. } => {
                serde_json::to_string_pretty(payload).ok()
            }
        }
    }
}

/// Parse the archive response of a request for the `range`.
pub fn parse_daily_production(
    range: DateRange,
    body: &str,
) -> Result<Vec<EnergyReading>, FetchError> {
    let payload: serde_json::Value = serde_json::from_str(body)
        .map_err(|source| FetchError::MalformedJson { body: body.to_owned(), source })?;

    if let Ok(Envelope { head: Some(head) }) = Envelope::deserialize(&payload)
        && let Some(status) = head.status
        && status.code != 0
    {
        let reason = if status.reason.is_empty() { status.user_message } else { status.reason };
        return Err(FetchError::Api { code: status.code, reason, payload });
    }

    let response = match ArchiveResponse::deserialize(&payload) {
        Ok(response) => response,
        Err(source) => return Err(FetchError::UnexpectedShape { payload, source }),
    };

    let readings = response
        .body
        .data
        .inverter
        .channels
        .energy_produced
        .values
        .into_iter()
        .filter_map(|(key, value)| {
            let Ok(offset) = key.parse::<u64>() else {
                debug!(%key, %value, "skipped a non-integer offset");
                return None;
            };
            let Some(value) = value.as_f64() else {
                debug!(offset, %value, "skipped a non-numeric value");
                return None;
            };
            if value < 0.0 {
                warn!(offset, value, "skipped a negative value");
                return None;
            }

            // Offsets are elapsed seconds, so the days after a DST switch are an hour off.
            let n_days = offset.saturating_add(SECONDS_PER_DAY / 2) / SECONDS_PER_DAY;
            let Some(date) = range.start.checked_add_days(Days::new(n_days)) else {
                warn!(offset, "skipped an out-of-range offset");
                return None;
            };
            if !range.contains(date) {
                warn!(%date, "skipped a reading outside of the requested range");
                return None;
            }
            let reading = EnergyReading { date, value: WattHours(value) };
            debug!(date = %reading.date, value = %reading.value);
            Some(reading)
        })
        .collect();
    Ok(readings)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use mockito::{Matcher, Server};

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn july(first_day: u32, last_day: u32) -> DateRange {
        DateRange { start: date(2025, 7, first_day), end: date(2025, 7, last_day) }
    }

    // language=JSON
    const RESPONSE: &str = r#"
        {
            "Body": {
                "Data": {
                    "inverter/1": {
                        "Data": {
                            "EnergyReal_WAC_Sum_Produced": {
                                "Unit": "Wh",
                                "Values": {
                                    "0": 64787.67,
                                    "86400": 26981.13
                                },
                                "_comment": "channelId=65549"
                            }
                        },
                        "DeviceType": 1,
                        "End": "2025-07-02T23:59:59+02:00",
                        "NodeType": 97,
                        "Start": "2025-07-01T00:00:00+02:00"
                    }
                }
            },
            "Head": {
                "RequestArguments": {
                    "Channel": ["EnergyReal_WAC_Sum_Produced"],
                    "EndDate": "2025-07-02T23:59:59+02:00",
                    "HumanReadable": "True",
                    "Scope": "System",
                    "SeriesType": "DailySum",
                    "StartDate": "2025-07-01T00:00:00+02:00"
                },
                "Status": {
                    "Code": 0,
                    "Reason": "",
                    "UserMessage": "",
                    "ErrorDetail": { "Nodes": [] }
                },
                "Timestamp": "2025-07-03T10:11:12+02:00"
            }
        }
    "#;

    #[test]
    fn test_parse_daily_production_ok() -> Result {
        let readings = parse_daily_production(july(1, 2), RESPONSE)?;
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].date, date(2025, 7, 1));
        assert_relative_eq!(readings[0].value.0, 64787.67);
        assert_eq!(readings[1].date, date(2025, 7, 2));
        assert_relative_eq!(readings[1].value.0, 26981.13);
        Ok(())
    }

    #[test]
    fn test_parse_skips_invalid_entries() -> Result {
        // language=JSON
        let body = r#"{
            "Body": {
                "Data": {
                    "inverter/1": {
                        "Data": {
                            "EnergyReal_WAC_Sum_Produced": {
                                "Values": {
                                    "0": null,
                                    "-86400": 1.0,
                                    "noon": 2.0,
                                    "172800": 3000,
                                    "86400": "many"
                                }
                            }
                        }
                    }
                }
            }
        }"#;
        let readings = parse_daily_production(july(1, 3), body)?;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].date, date(2025, 7, 3));
        assert_relative_eq!(readings[0].value.0, 3000.0);
        Ok(())
    }

    #[test]
    fn test_parse_aligns_to_nearest_date() -> Result {
        // language=JSON
        let body = r#"{"Body":{"Data":{"inverter/1":{"Data":{"EnergyReal_WAC_Sum_Produced":{"Values":{"90000":5.0}}}}}}}"#;
        let range = DateRange { start: date(2025, 7, 31), end: date(2025, 8, 1) };
        let readings = parse_daily_production(range, body)?;
        assert_eq!(readings[0].date, date(2025, 8, 1));
        Ok(())
    }

    #[test]
    fn test_parse_across_spring_dst_switch() -> Result {
        // The day after the switch is only 23 hours away from the previous one.
        // language=JSON
        let body = r#"{"Body":{"Data":{"inverter/1":{"Data":{"EnergyReal_WAC_Sum_Produced":{"Values":{"0":1,"86400":2,"169200":3}}}}}}}"#;
        let range = DateRange { start: date(2025, 3, 29), end: date(2025, 3, 31) };
        let readings = parse_daily_production(range, body)?;
        let dates: Vec<_> = readings.iter().map(|reading| reading.date).collect();
        assert_eq!(dates, [date(2025, 3, 29), date(2025, 3, 30), date(2025, 3, 31)]);
        assert_relative_eq!(readings[2].value.0, 3.0);
        Ok(())
    }

    #[test]
    fn test_parse_skips_negative_values() -> Result {
        // language=JSON
        let body = r#"{"Body":{"Data":{"inverter/1":{"Data":{"EnergyReal_WAC_Sum_Produced":{"Values":{"0":-0.4,"86400":12.5}}}}}}}"#;
        let readings = parse_daily_production(july(1, 2), body)?;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].date, date(2025, 7, 2));
        assert_relative_eq!(readings[0].value.0, 12.5);
        Ok(())
    }

    #[test]
    fn test_parse_skips_readings_outside_range() -> Result {
        let readings = parse_daily_production(july(1, 1), RESPONSE)?;
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].date, date(2025, 7, 1));
        Ok(())
    }

    #[test]
    fn test_parse_unexpected_shape() {
        let error = parse_daily_production(july(1, 2), r#"{"unexpected":"shape"}"#)
            .unwrap_err();
        assert!(matches!(error, FetchError::UnexpectedShape { .. }), "{error:?}");
        assert!(error.payload().unwrap().contains(r#""unexpected": "shape""#));
    }

    #[test]
    fn test_parse_malformed_json() {
        let error = parse_daily_production(july(1, 2), "<html>oops</html>").unwrap_err();
        assert!(matches!(error, FetchError::MalformedJson { .. }), "{error:?}");
        assert_eq!(error.payload().as_deref(), Some("<html>oops</html>"));
    }

    #[test]
    fn test_parse_api_error() {
        // language=JSON
        let body = r#"{
            "Body": { "Data": {} },
            "Head": { "Status": { "Code": 255, "Reason": "Query too long", "UserMessage": "" } }
        }"#;
        let error = parse_daily_production(july(1, 2), body).unwrap_err();
        match error {
            FetchError::Api { code, reason, .. } => {
                assert_eq!(code, 255);
                assert_eq!(reason, "Query too long");
            }
            _ => panic!("unexpected error: {error:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_daily_production_ok() -> Result {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/solar_api/v1/GetArchiveData.cgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Scope".into(), "System".into()),
                Matcher::UrlEncoded("Channel".into(), "EnergyReal_WAC_Sum_Produced".into()),
                Matcher::UrlEncoded("SeriesType".into(), "DailySum".into()),
                Matcher::UrlEncoded("StartDate".into(), "2025-07-01".into()),
                Matcher::UrlEncoded("EndDate".into(), "2025-07-02".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(RESPONSE)
            .create_async()
            .await;

        let client = Client::new(&server.host_with_port(), Duration::from_secs(5))?;
        let range = DateRange::try_new(date(2025, 7, 1), date(2025, 7, 2))?;
        let readings = client.get_daily_production(range).await?;
        assert_eq!(readings.len(), 2);
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_get_daily_production_http_error() -> Result {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/solar_api/v1/GetArchiveData.cgi")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = Client::new(&server.url(), Duration::from_secs(5))?;
        let range = DateRange::try_new(date(2025, 7, 1), date(2025, 7, 1))?;
        let error = client.get_daily_production(range).await.unwrap_err();
        assert!(matches!(error, FetchError::Request { .. }), "{error:?}");
        assert!(error.payload().is_none());
        Ok(())
    }

    #[test]
    fn test_new_rejects_invalid_address() {
        assert!(Client::new("http://", Duration::from_secs(1)).is_err());
    }
}
