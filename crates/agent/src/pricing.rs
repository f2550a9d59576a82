pub const BASE_PRICE: f64 = 250.0;
pub const GRANDE_SURCHARGE: f64 = 50.0;
pub const VENTI_SURCHARGE: f64 = 100.0;
pub const EXTRA_PRICE: f64 = 30.0;

/// Price in rupees. Sizes other than Grande and Venti cost the base price.
pub fn price_order(size: &str, extras: &[String]) -> f64 {
    let size_surcharge = match size {
        "Grande" => GRANDE_SURCHARGE,
        "Venti" => VENTI_SURCHARGE,
        _ => 0.0,
    };
    BASE_PRICE + size_surcharge + extras.len() as f64 * EXTRA_PRICE
}
