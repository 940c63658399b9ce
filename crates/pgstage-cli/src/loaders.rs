use pgstage_api::{ApiConfig, PagedApiReader};
use pgstage_core::{
    Entity, LoadError, LoadResult, Loader, LoaderDefinition, RunOutcome, SinkWriter, SourceReader,
};
use pgstage_pg::{
    CourierLedgerSink, CourierLedgersSource, OrderSink, OrdersSource, PgCheckpointStore,
    PgTransaction, PgWarehouse, ProductSaleSink, ProductSalesSource, StagingSink,
};

/// Everything a loader run needs besides its own definition.
pub struct RunContext {
    pub warehouse: PgWarehouse,
    /// Connection string of the upstream database.
    pub origin: String,
    pub api: Option<ApiConfig>,
    pub checkpoints: PgCheckpointStore,
}

/// Build the reader and writer for `def.entity` and run one load cycle.
pub async fn run_loader(ctx: &RunContext, def: &LoaderDefinition) -> LoadResult<RunOutcome> {
    match def.entity {
        Entity::Couriers | Entity::Deliveries => {
            let api = ctx.api.as_ref().ok_or_else(|| {
                LoadError::InvalidConfig(format!("loader '{}' needs an [api] section", def.name))
            })?;
            let resource = def.entity.api_resource().ok_or_else(|| {
                LoadError::InvalidConfig(format!("{} has no API resource", def.entity))
            })?;
            let source = PagedApiReader::new(api, resource, def.sort_field.as_str())?;
            run(ctx, def, source, StagingSink::new(def.table.as_str())).await
        }
        Entity::Orders => {
            let source = OrdersSource::connect(&ctx.origin)
                .await
                .map_err(|e| LoadError::source(e.to_string()))?;
            run(ctx, def, source, OrderSink::new(def.table.as_str())).await
        }
        Entity::ProductSales => {
            let source = ProductSalesSource::connect(&ctx.origin)
                .await
                .map_err(|e| LoadError::source(e.to_string()))?;
            run(ctx, def, source, ProductSaleSink::new(def.table.as_str())).await
        }
        Entity::CourierLedgers => {
            let source = CourierLedgersSource::connect(&ctx.origin)
                .await
                .map_err(|e| LoadError::source(e.to_string()))?;
            run(ctx, def, source, CourierLedgerSink::new(def.table.as_str())).await
        }
    }
}

async fn run<S, W>(
    ctx: &RunContext,
    def: &LoaderDefinition,
    source: S,
    sink: W,
) -> LoadResult<RunOutcome>
where
    S: SourceReader,
    W: SinkWriter<PgTransaction, S::Record>,
{
    let loader = Loader::new(
        def.workflow_key.as_str(),
        def.batch_limit,
        source,
        sink,
        ctx.checkpoints.clone(),
    )?;
    loader.run(&ctx.warehouse).await
}
