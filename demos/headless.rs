use overzoom::prelude::*;
use overzoom::RenderContext;
use std::io::Cursor;
use std::time::Duration;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

/// Tiles are generated on demand after a short delay, standing in for a
/// network source. Each tile is a flat colour derived from its coordinate.
struct SyntheticSource {
    cache: TileCache,
    latency: Duration,
}

impl SyntheticSource {
    fn render(coord: &TileCoord) -> Result<Vec<u8>> {
        let shade = |v: u32| ((v * 40) % 256) as u8;
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            256,
            256,
            Rgba([shade(coord.x), shade(coord.y), shade(coord.z as u32), 255]),
        ));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl CachingTileSource for SyntheticSource {
    fn cached_data(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.cache.get(coord)
    }

    async fn load_tile(&self, coord: &TileCoord) -> Result<Arc<Vec<u8>>> {
        tokio::time::sleep(self.latency).await;
        let data = Arc::new(Self::render(coord)?);
        self.cache.put(coord, Arc::clone(&data));
        Ok(data)
    }
}

/// Wait until `count` fetches have settled
async fn settle(renderer: &CachingTileRenderer<SyntheticSource>, count: usize) -> Vec<RedrawRequest> {
    let mut redraws = Vec::new();
    while redraws.len() < count {
        redraws.extend(renderer.drain_redraw_requests());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    redraws
}

fn report(label: &str, stats: &DrawStats) {
    println!(
        "   {:<22} z={} tiles={} exact={} fallback={} blank={} fetches={}",
        label, stats.zoom, stats.tiles, stats.exact, stats.fallback, stats.blank, stats.fetches_started
    );
}

/// Drive the caching renderer without any UI
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Overzoom Headless Example");
    println!("=========================");

    let source = Arc::new(SyntheticSource {
        cache: TileCache::new(256),
        latency: Duration::from_millis(50),
    });
    let config = OverlayConfig {
        world_size: 4096.0,
        ..OverlayProfile::Balanced.resolve()
    };
    let renderer = CachingTileRenderer::new(Arc::clone(&source), config)?;
    let mut ctx = RenderContext::new(512, 512);

    println!("\nZoomed out (scale 0.25):");
    ctx.set_view(Point::new(0.0, 0.0), 0.25);
    let stats = renderer.draw(&ctx.visible_map_rect(), ctx.zoom_scale, &mut ctx);
    report("cold cache", &stats);

    let redraws = settle(&renderer, stats.fetches_started).await;
    println!("   {} redraw requests", redraws.len());

    ctx.begin_frame();
    report("after loading", &renderer.draw(&ctx.visible_map_rect(), ctx.zoom_scale, &mut ctx));

    println!("\nZoomed in (scale 0.5):");
    ctx.set_view(Point::new(0.0, 0.0), 0.5);
    ctx.begin_frame();
    let stats = renderer.draw(&ctx.visible_map_rect(), ctx.zoom_scale, &mut ctx);
    report("parents as fallback", &stats);

    // A second pass before anything settles starts no new fetches.
    ctx.begin_frame();
    let repeat = renderer.draw(&ctx.visible_map_rect(), ctx.zoom_scale, &mut ctx);
    report("repeat pass", &repeat);
    println!("   {} fetches already in flight", repeat.fetches_in_flight);

    settle(&renderer, stats.fetches_started).await;
    ctx.begin_frame();
    report("after loading", &renderer.draw(&ctx.visible_map_rect(), ctx.zoom_scale, &mut ctx));
    println!("   {} draw commands queued", ctx.drawing_queue.len());

    let cache = source.cache.stats();
    println!("\nCache: {} tiles, {} hits, {} misses", cache.size, cache.hits, cache.misses);

    Ok(())
}
