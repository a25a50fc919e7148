use chrono::{Days, NaiveDate};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;
use crate::external::graph_transport::{GraphReply, GraphTransport, ReqwestTransport};
use crate::models::{AdSet, AdStudyCell, AudienceSize, Campaign, GraphPage, MetricRecord, HOURLY_RANGE_FIELD};

pub const DEFAULT_BREAKDOWNS: &str = "gender,age";
const AD_LEVEL_FIELDS: &str = "ad_id,ad_name,actions,impressions,spend,reach,cpm,cpc,ctr";
const AUDIENCE_SIZE_FIELDS: &str = "approximate_count_lower_bound,approximate_count_upper_bound";

type Query = Vec<(&'static str, String)>;

/// Client for the Graph API marketing (insights) endpoints.
///
/// Failures never escape: a non-200 answer, an unreachable host or an
/// undecodable body is logged and reported to the caller as "no data"
/// (`None` or an empty list). There is no retry and no backoff.
pub struct MarketingApiClient {
    config: ApiConfig,
    transport: Box<dyn GraphTransport>,
}

impl MarketingApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let transport = Box::new(ReqwestTransport::new(config.timeout));
        Self { config, transport }
    }

    pub fn with_transport(config: ApiConfig, transport: Box<dyn GraphTransport>) -> Self {
        Self { config, transport }
    }

    /// Daily rows (`time_increment=1`) over `[since, until]`.
    pub async fn get_stat_per_day(
        &self,
        entity_id: &str,
        since: NaiveDate,
        until: NaiveDate,
        stat: &str,
    ) -> Option<Vec<MetricRecord>> {
        let query = self.query(vec![
            ("time_range", time_range(since, until)),
            ("fields", stat.to_string()),
            ("time_increment", "1".to_string()),
        ]);
        let context = format!("insights for ad set {}", entity_id);

        self.fetch_records(&self.insights_url(entity_id), &query, &context)
            .await
            .filter(|data| !data.is_empty())
    }

    /// A single aggregate row over the entity's whole lifetime.
    pub async fn get_adset_total_stat(&self, entity_id: &str, stat: &str) -> Option<Vec<MetricRecord>> {
        let query = self.query(vec![
            ("fields", stat.to_string()),
            ("date_preset", "maximum".to_string()),
        ]);
        let context = format!("insights for ad set {}", entity_id);

        self.fetch_records(&self.insights_url(entity_id), &query, &context)
            .await
            .filter(|data| !data.is_empty())
    }

    /// Hourly rows for one calendar day.
    pub async fn get_hourly_stat_for_day(
        &self,
        day: NaiveDate,
        entity_id: &str,
        stat: &str,
    ) -> Vec<MetricRecord> {
        let query = self.query(vec![
            ("fields", stat.to_string()),
            ("time_range", time_range(day, day)),
            ("time_increment", "1".to_string()),
            ("breakdowns", HOURLY_RANGE_FIELD.to_string()),
        ]);
        let context = format!("hourly data for {} on {}", entity_id, day);

        self.fetch_records(&self.insights_url(entity_id), &query, &context)
            .await
            .unwrap_or_default()
    }

    /// Hourly rows for every day in `[start, end]`, one request per day,
    /// concatenated in day order.
    pub async fn get_hourly_stat(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        entity_id: &str,
        stat: &str,
    ) -> Vec<MetricRecord> {
        let mut all = Vec::new();
        let mut current = start;

        while current <= end {
            let daily = self.get_hourly_stat_for_day(current, entity_id, stat).await;
            debug!("{}: {} hourly rows on {}", entity_id, daily.len(), current);
            all.extend(daily);

            match current.checked_add_days(Days::new(1)) {
                Some(next) => current = next,
                None => break,
            }
        }

        all
    }

    /// Lifetime rows segmented by `breakdowns` (e.g. `gender,age`).
    pub async fn get_stat_by_breakdown(
        &self,
        entity_id: &str,
        stat: &str,
        breakdowns: &str,
    ) -> Vec<MetricRecord> {
        let query = self.query(vec![
            ("fields", stat.to_string()),
            ("breakdowns", breakdowns.to_string()),
            ("time_increment", "1".to_string()),
            ("date_preset", "maximum".to_string()),
        ]);
        let context = format!("{} breakdown for {}", breakdowns, entity_id);

        self.fetch_records(&self.insights_url(entity_id), &query, &context)
            .await
            .unwrap_or_default()
    }

    /// Named cells (experiment arms) of an ad study.
    pub async fn get_ad_study(&self, ad_study_id: &str) -> Vec<AdStudyCell> {
        let url = self.config.endpoint(&format!("{}/cells", ad_study_id));
        let query = self.query(vec![("fields", "name".to_string())]);
        let context = format!("ad study {}", ad_study_id);

        match self.fetch_page::<AdStudyCell>(&url, &query, &context).await {
            Some(page) => page.data,
            None => Vec::new(),
        }
    }

    /// Campaigns of the configured ad account whose name contains `name_filter`.
    pub async fn get_campaigns_by_name(&self, name_filter: &str) -> Vec<Campaign> {
        let url = self
            .config
            .endpoint(&format!("{}/campaigns", self.config.account_id));
        let filtering = json!([{ "field": "name", "operator": "CONTAIN", "value": name_filter }]);
        let query = self.query(vec![
            ("fields", "name,id,start_time".to_string()),
            ("filtering", filtering.to_string()),
        ]);

        let campaigns = self
            .fetch_all_pages::<Campaign>(&url, query, "campaigns")
            .await;
        info!("Found {} campaigns matching '{}'", campaigns.len(), name_filter);
        campaigns
    }

    pub async fn get_adsets_by_campaign_id(&self, campaign_id: &str) -> Vec<AdSet> {
        let url = self.config.endpoint(&format!("{}/adsets", campaign_id));
        let query = self.query(vec![("fields", "name,id".to_string())]);
        let context = format!("ad sets of campaign {}", campaign_id);

        self.fetch_all_pages::<AdSet>(&url, query, &context).await
    }

    pub async fn get_custom_audience_size(&self, audience_id: &str) -> Option<AudienceSize> {
        let url = self.config.endpoint(audience_id);
        let query = self.query(vec![("fields", AUDIENCE_SIZE_FIELDS.to_string())]);
        let context = format!("custom audience {}", audience_id);

        let reply = self.send(&url, &query, &context).await?;
        decode(&reply, &context)
    }

    /// Lifetime ad-level summary (actions, impressions, spend, reach, cpm, cpc, ctr).
    pub async fn get_ad_level_data(&self, ad_id: &str) -> Option<Vec<MetricRecord>> {
        let query = self.query(vec![
            ("fields", AD_LEVEL_FIELDS.to_string()),
            ("level", "ad".to_string()),
            ("date_preset", "maximum".to_string()),
        ]);
        let context = format!("ad level data for ad {}", ad_id);

        self.fetch_records(&self.insights_url(ad_id), &query, &context).await
    }

    fn insights_url(&self, entity_id: &str) -> String {
        self.config.endpoint(&format!("{}/insights", entity_id))
    }

    fn query(&self, mut params: Query) -> Query {
        params.push(("access_token", self.config.access_token.clone()));
        params
    }

    async fn send(&self, url: &str, query: &[(&'static str, String)], context: &str) -> Option<GraphReply> {
        match self.transport.get(url, query).await {
            Ok(reply) if reply.is_ok() => Some(reply),
            Ok(reply) => {
                error!("Error fetching {}: {}, {}", context, reply.status, reply.body);
                None
            }
            Err(e) => {
                error!("Error fetching {}: {}", context, e);
                None
            }
        }
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        context: &str,
    ) -> Option<GraphPage<T>> {
        let reply = self.send(url, query, context).await?;
        decode(&reply, context)
    }

    async fn fetch_records(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        context: &str,
    ) -> Option<Vec<MetricRecord>> {
        self.fetch_page::<MetricRecord>(url, query, context)
            .await
            .map(|page| page.data)
    }

    /// Follows `paging.next` until the API stops announcing one.
    ///
    /// Cursor URLs already carry every parameter, so they are requested
    /// as-is. A failing page ends the walk with what was collected so far.
    async fn fetch_all_pages<T: DeserializeOwned>(&self, url: &str, query: Query, context: &str) -> Vec<T> {
        let mut all = Vec::new();
        let mut url = url.to_string();
        let mut query = query;
        let mut pages = 0usize;

        loop {
            let Some(page) = self.fetch_page::<T>(&url, &query, context).await else {
                if pages > 0 {
                    warn!("Stopped paging {} after {} pages", context, pages);
                }
                break;
            };
            pages += 1;

            let next = page.next_url().map(str::to_string);
            all.extend(page.data);

            match next {
                Some(next) => {
                    url = next;
                    query = Vec::new();
                }
                None => break,
            }
        }

        debug!("Fetched {} items of {} over {} pages", all.len(), context, pages);
        all
    }
}

fn time_range(since: NaiveDate, until: NaiveDate) -> String {
    json!({
        "since": since.format("%Y-%m-%d").to_string(),
        "until": until.format("%Y-%m-%d").to_string(),
    })
    .to_string()
}

fn decode<T: DeserializeOwned>(reply: &GraphReply, context: &str) -> Option<T> {
    match serde_json::from_str(&reply.body) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Unreadable response for {}: {}", context, e);
            None
        }
    }
}
