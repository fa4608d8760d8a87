//! OLX ページのセレクタ

/// 検索結果のリスティングカード
pub const RESULT_ITEM: &str = "li[data-aut-id='itemBox']";
/// 検索結果カード内のリンク
pub const RESULT_LINK: &str = "li[data-aut-id='itemBox'] a";

/// 「もっと見る」ボタン
pub const LOAD_MORE_BUTTON: &str = "button[data-aut-id='btnLoadMore']";

// ロケーション検索
pub const LOCATION_INPUT: &str = "input._1dasd";
pub const LOCATION_SUGGESTION: &str = "[data-aut-id='locationItem']";
pub const SEARCH_BUTTON: &str = "button[data-aut-id='btnSearch']";

// 詳細ページ
pub const ITEM_TITLE: &str = "[data-aut-id='itemTitle']";
pub const ITEM_PRICE: &str = "[data-aut-id='itemPrice']";
pub const ITEM_FUEL: &str = "[data-aut-id='itemAttribute_fuel']";
pub const ITEM_MILEAGE: &str = "[data-aut-id='itemAttribute_mileage']";
pub const ITEM_TRANSMISSION: &str = "[data-aut-id='itemAttribute_transmission']";
pub const ITEM_SUBTITLE: &str = ".BxCeR";
/// 2番目の要素が所在地
pub const ITEM_LOCATION: &str = "._3VRXh";
